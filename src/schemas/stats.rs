use serde::Serialize;

use crate::repositories::stats::CourseRevenueRow;

#[derive(Debug, Serialize)]
pub(crate) struct CourseRevenueResponse {
    pub(crate) course_id: String,
    pub(crate) course_name: String,
    pub(crate) total_revenue: f64,
    pub(crate) student_count: i64,
}

impl CourseRevenueResponse {
    pub(crate) fn from_row(row: CourseRevenueRow) -> Self {
        Self {
            course_id: row.course_id,
            course_name: row.course_name,
            total_revenue: row.total_revenue,
            student_count: row.student_count,
        }
    }
}
