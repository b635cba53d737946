use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;
use crate::repositories::enrollments::EnrollmentWithStudent;

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentCreate {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
    #[serde(alias = "groupId")]
    pub(crate) group_id: String,
    #[serde(default)]
    #[serde(alias = "agreedPrice")]
    pub(crate) agreed_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) group_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) agreed_price: f64,
    pub(crate) enrolled_at: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            group_id: enrollment.group_id,
            status: enrollment.status,
            agreed_price: enrollment.agreed_price,
            enrolled_at: format_primitive(enrollment.enrolled_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterEntryResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) agreed_price: f64,
    pub(crate) enrolled_at: String,
}

impl RosterEntryResponse {
    pub(crate) fn from_view(view: EnrollmentWithStudent) -> Self {
        Self {
            id: view.id,
            student_id: view.student_id,
            first_name: view.first_name,
            last_name: view.last_name,
            status: view.status,
            agreed_price: view.agreed_price,
            enrolled_at: format_primitive(view.enrolled_at),
        }
    }
}
