use serde::{Deserialize, Serialize};

use crate::core::time::{format_date, format_primitive};
use crate::db::models::{Guardian, Student, Teacher, User};

#[derive(Debug, Deserialize)]
pub(crate) struct TeacherCreate {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) specialty: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeacherUpdate {
    #[serde(default)]
    pub(crate) specialty: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TeacherResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) specialty: Option<String>,
    pub(crate) photo_key: Option<String>,
    pub(crate) created_at: String,
}

impl TeacherResponse {
    pub(crate) fn from_db(teacher: Teacher, user: &User) -> Self {
        Self {
            id: teacher.id,
            user_id: teacher.user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            specialty: teacher.specialty,
            photo_key: teacher.photo_key,
            created_at: format_primitive(teacher.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentCreate {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
    #[serde(default)]
    #[serde(alias = "birthDate")]
    pub(crate) birth_date: Option<String>,
    #[serde(default)]
    #[serde(alias = "schoolId")]
    pub(crate) school_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StudentUpdate {
    #[serde(default)]
    #[serde(alias = "birthDate")]
    pub(crate) birth_date: Option<String>,
    #[serde(default)]
    #[serde(alias = "schoolId")]
    pub(crate) school_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) birth_date: Option<String>,
    pub(crate) school_id: Option<String>,
    pub(crate) photo_key: Option<String>,
    pub(crate) created_at: String,
}

impl StudentResponse {
    pub(crate) fn from_db(student: Student, user: &User) -> Self {
        Self {
            id: student.id,
            user_id: student.user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            birth_date: student.birth_date.map(format_date),
            school_id: student.school_id,
            photo_key: student.photo_key,
            created_at: format_primitive(student.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuardianCreate {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GuardianUpdate {
    #[serde(default)]
    pub(crate) phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GuardianResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) email: String,
    pub(crate) phone: Option<String>,
    pub(crate) created_at: String,
}

impl GuardianResponse {
    pub(crate) fn from_db(guardian: Guardian, user: &User) -> Self {
        Self {
            id: guardian.id,
            user_id: guardian.user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: guardian.phone,
            created_at: format_primitive(guardian.created_at),
        }
    }
}
