use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Classroom, Course, Level};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct CourseCreate {
    #[validate(length(min = 1))]
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CourseUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl CourseResponse {
    pub(crate) fn from_db(course: Course) -> Self {
        Self {
            id: course.id,
            name: course.name,
            description: course.description,
            is_active: course.is_active,
            created_at: format_primitive(course.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct LevelCreate {
    #[validate(length(min = 1))]
    pub(crate) name: String,
    #[serde(alias = "levelOrder")]
    #[validate(range(min = 1))]
    pub(crate) level_order: i32,
    #[serde(default)]
    #[serde(alias = "basePrice")]
    pub(crate) base_price: f64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LevelUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    #[serde(alias = "basePrice")]
    pub(crate) base_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LevelResponse {
    pub(crate) id: String,
    pub(crate) course_id: String,
    pub(crate) name: String,
    pub(crate) level_order: i32,
    pub(crate) base_price: f64,
    pub(crate) created_at: String,
}

impl LevelResponse {
    pub(crate) fn from_db(level: Level) -> Self {
        Self {
            id: level.id,
            course_id: level.course_id,
            name: level.name,
            level_order: level.level_order,
            base_price: level.base_price,
            created_at: format_primitive(level.created_at),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ClassroomCreate {
    #[validate(length(min = 1))]
    pub(crate) name: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub(crate) capacity: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassroomUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) capacity: Option<i32>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    pub(crate) is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassroomResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) capacity: i32,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl ClassroomResponse {
    pub(crate) fn from_db(classroom: Classroom) -> Self {
        Self {
            id: classroom.id,
            name: classroom.name,
            capacity: classroom.capacity,
            is_active: classroom.is_active,
            created_at: format_primitive(classroom.created_at),
        }
    }
}
