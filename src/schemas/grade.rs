use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::repositories::grades::{GradeWithStudent, StudentGradeRow};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeBatchRequest {
    #[serde(alias = "groupId")]
    pub(crate) group_id: String,
    #[validate(range(min = 1, max = 2))]
    pub(crate) period: i32,
    #[validate(nested)]
    pub(crate) grades: Vec<GradeInput>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct GradeInput {
    #[serde(alias = "enrollmentId")]
    pub(crate) enrollment_id: String,
    #[validate(range(min = 0.0, max = 100.0))]
    pub(crate) score: f64,
    #[serde(default)]
    pub(crate) comments: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeBatchResponse {
    pub(crate) saved: usize,
}

#[derive(Debug, Serialize)]
pub(crate) struct GroupGradeResponse {
    pub(crate) id: String,
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) period: i32,
    pub(crate) score: f64,
    pub(crate) comments: Option<String>,
}

impl GroupGradeResponse {
    pub(crate) fn from_row(row: GradeWithStudent) -> Self {
        Self {
            id: row.id,
            enrollment_id: row.enrollment_id,
            student_id: row.student_id,
            first_name: row.first_name,
            last_name: row.last_name,
            period: row.period,
            score: row.score,
            comments: row.comments,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentGradeResponse {
    pub(crate) id: String,
    pub(crate) enrollment_id: String,
    pub(crate) group_id: String,
    pub(crate) group_code: String,
    pub(crate) period: i32,
    pub(crate) score: f64,
    pub(crate) comments: Option<String>,
}

impl StudentGradeResponse {
    pub(crate) fn from_row(row: StudentGradeRow) -> Self {
        Self {
            id: row.id,
            enrollment_id: row.enrollment_id,
            group_id: row.group_id,
            group_code: row.group_code,
            period: row.period,
            score: row.score,
            comments: row.comments,
        }
    }
}
