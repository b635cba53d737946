use sqlx::PgPool;
use time::{Date, Time};
use uuid::Uuid;

use crate::db::types::AttendanceStatus;

/// Roster row for one group/date: every active enrollment with that day's
/// record where one exists. `status` is `None` when attendance has not been
/// taken for the student yet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct DayRosterRow {
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) status: Option<AttendanceStatus>,
    pub(crate) arrival_time: Option<Time>,
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RangeCountsRow {
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) present_count: i64,
    pub(crate) absent_count: i64,
    pub(crate) late_count: i64,
    pub(crate) excused_count: i64,
}

pub(crate) struct UpsertRecord<'a> {
    pub(crate) enrollment_id: &'a str,
    pub(crate) status: AttendanceStatus,
    pub(crate) arrival_time: Option<Time>,
    pub(crate) notes: Option<&'a str>,
}

pub(crate) async fn day_roster(
    pool: &PgPool,
    group_id: &str,
    date: Date,
) -> Result<Vec<DayRosterRow>, sqlx::Error> {
    sqlx::query_as::<_, DayRosterRow>(
        "SELECT e.id AS enrollment_id, s.id AS student_id,
                u.first_name, u.last_name,
                a.status, a.arrival_time, a.notes
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         JOIN users u ON u.id = s.user_id
         LEFT JOIN attendance a
                ON a.enrollment_id = e.id AND a.attendance_date = $2
         WHERE e.group_id = $1 AND e.status = 'active'
         ORDER BY u.last_name, u.first_name",
    )
    .bind(group_id)
    .bind(date)
    .fetch_all(pool)
    .await
}

/// Upserts the whole batch inside one transaction: either every record
/// persists or none does. Existing (enrollment, date) rows are overwritten.
pub(crate) async fn save_batch(
    pool: &PgPool,
    date: Date,
    recorded_by: &str,
    records: &[UpsertRecord<'_>],
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for record in records {
        sqlx::query(
            "INSERT INTO attendance (
                id, enrollment_id, attendance_date, status, arrival_time,
                notes, recorded_by, created_at, updated_at
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)
             ON CONFLICT (enrollment_id, attendance_date)
             DO UPDATE SET status = EXCLUDED.status,
                           arrival_time = EXCLUDED.arrival_time,
                           notes = EXCLUDED.notes,
                           recorded_by = EXCLUDED.recorded_by,
                           updated_at = EXCLUDED.updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(record.enrollment_id)
        .bind(date)
        .bind(record.status)
        .bind(record.arrival_time)
        .bind(record.notes)
        .bind(recorded_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub(crate) async fn range_counts(
    pool: &PgPool,
    group_id: &str,
    start_date: Date,
    end_date: Date,
) -> Result<Vec<RangeCountsRow>, sqlx::Error> {
    sqlx::query_as::<_, RangeCountsRow>(
        "SELECT e.id AS enrollment_id, s.id AS student_id,
                u.first_name, u.last_name,
                COUNT(a.id) FILTER (WHERE a.status = 'present') AS present_count,
                COUNT(a.id) FILTER (WHERE a.status = 'absent') AS absent_count,
                COUNT(a.id) FILTER (WHERE a.status = 'late') AS late_count,
                COUNT(a.id) FILTER (WHERE a.status = 'excused') AS excused_count
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         JOIN users u ON u.id = s.user_id
         LEFT JOIN attendance a
                ON a.enrollment_id = e.id
               AND a.attendance_date BETWEEN $2 AND $3
         WHERE e.group_id = $1 AND e.status = 'active'
         GROUP BY e.id, s.id, u.first_name, u.last_name
         ORDER BY u.last_name, u.first_name",
    )
    .bind(group_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_all(pool)
    .await
}

/// Distinct class dates recorded for the group within the range.
pub(crate) async fn count_distinct_dates(
    pool: &PgPool,
    group_id: &str,
    start_date: Date,
    end_date: Date,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(DISTINCT a.attendance_date)
         FROM attendance a
         JOIN enrollments e ON e.id = a.enrollment_id
         WHERE e.group_id = $1 AND a.attendance_date BETWEEN $2 AND $3",
    )
    .bind(group_id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(pool)
    .await
}
