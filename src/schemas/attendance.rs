use serde::{Deserialize, Serialize};

use crate::core::time::format_time_of_day;
use crate::db::types::AttendanceStatus;
use crate::repositories::attendance::{DayRosterRow, RangeCountsRow};

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceBatchRequest {
    #[serde(alias = "groupId")]
    pub(crate) group_id: String,
    pub(crate) date: String,
    pub(crate) records: Vec<AttendanceRecordInput>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttendanceRecordInput {
    #[serde(alias = "enrollmentId")]
    pub(crate) enrollment_id: String,
    pub(crate) status: AttendanceStatus,
    #[serde(default)]
    pub(crate) notes: Option<String>,
    #[serde(default)]
    #[serde(alias = "arrivalTime")]
    pub(crate) arrival_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DayRosterResponse {
    pub(crate) group_id: String,
    pub(crate) date: String,
    pub(crate) records: Vec<DayRosterEntry>,
}

/// `status` stays `null` for students whose attendance has not been taken
/// on the requested date.
#[derive(Debug, Serialize)]
pub(crate) struct DayRosterEntry {
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) status: Option<AttendanceStatus>,
    pub(crate) arrival_time: Option<String>,
    pub(crate) notes: Option<String>,
}

impl DayRosterEntry {
    pub(crate) fn from_row(row: DayRosterRow) -> Self {
        Self {
            enrollment_id: row.enrollment_id,
            student_id: row.student_id,
            first_name: row.first_name,
            last_name: row.last_name,
            status: row.status,
            arrival_time: row.arrival_time.map(format_time_of_day),
            notes: row.notes,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveBatchResponse {
    pub(crate) saved: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatsQuery {
    #[serde(alias = "startDate")]
    pub(crate) start_date: String,
    #[serde(alias = "endDate")]
    pub(crate) end_date: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttendanceStatsResponse {
    pub(crate) group_id: String,
    pub(crate) start_date: String,
    pub(crate) end_date: String,
    pub(crate) total_classes: i64,
    pub(crate) students: Vec<StudentAttendanceStats>,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentAttendanceStats {
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) present: i64,
    pub(crate) absent: i64,
    pub(crate) late: i64,
    pub(crate) excused: i64,
    pub(crate) attendance_rate: String,
}

impl StudentAttendanceStats {
    pub(crate) fn from_row(row: RangeCountsRow, total_classes: i64) -> Self {
        let rate = attendance_rate(row.present_count, row.late_count, total_classes);
        Self {
            enrollment_id: row.enrollment_id,
            student_id: row.student_id,
            first_name: row.first_name,
            last_name: row.last_name,
            present: row.present_count,
            absent: row.absent_count,
            late: row.late_count,
            excused: row.excused_count,
            attendance_rate: rate,
        }
    }
}

/// (present + late) / total, as a percentage with one decimal. A range with
/// no recorded classes reports "0.0" instead of dividing by zero.
pub(crate) fn attendance_rate(present: i64, late: i64, total_classes: i64) -> String {
    if total_classes <= 0 {
        return "0.0".to_string();
    }
    let rate = (present + late) as f64 / total_classes as f64 * 100.0;
    format!("{rate:.1}")
}

#[cfg(test)]
mod tests {
    use super::attendance_rate;

    #[test]
    fn rate_is_zero_without_classes() {
        assert_eq!(attendance_rate(0, 0, 0), "0.0");
        assert_eq!(attendance_rate(5, 2, 0), "0.0");
    }

    #[test]
    fn rate_counts_late_as_attended() {
        assert_eq!(attendance_rate(8, 2, 10), "100.0");
        assert_eq!(attendance_rate(7, 1, 10), "80.0");
    }

    #[test]
    fn rate_rounds_to_one_decimal() {
        assert_eq!(attendance_rate(1, 0, 3), "33.3");
        assert_eq!(attendance_rate(2, 0, 3), "66.7");
    }
}
