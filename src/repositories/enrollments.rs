use sqlx::PgPool;

use crate::db::models::Enrollment;
use crate::db::types::EnrollmentStatus;

const COLUMNS: &str =
    "id, student_id, group_id, status, agreed_price, enrolled_at, updated_at";

/// Enrollment joined with the student's user record for roster display,
/// ordered by surname where listed.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct EnrollmentWithStudent {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) agreed_price: f64,
    pub(crate) enrolled_at: time::PrimitiveDateTime,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
}

pub(crate) struct CreateEnrollment<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) group_id: &'a str,
    pub(crate) agreed_price: f64,
    pub(crate) enrolled_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateEnrollment<'_>,
) -> Result<Enrollment, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "INSERT INTO enrollments (id, student_id, group_id, status, agreed_price, enrolled_at, updated_at)
         VALUES ($1,$2,$3,'active',$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.group_id)
    .bind(params.agreed_price)
    .bind(params.enrolled_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!("SELECT {COLUMNS} FROM enrollments WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_pair(
    pool: &PgPool,
    student_id: &str,
    group_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM enrollments WHERE student_id = $1 AND group_id = $2",
    )
    .bind(student_id)
    .bind(group_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_group(
    pool: &PgPool,
    group_id: &str,
) -> Result<Vec<EnrollmentWithStudent>, sqlx::Error> {
    sqlx::query_as::<_, EnrollmentWithStudent>(
        "SELECT e.id, e.student_id, e.status, e.agreed_price, e.enrolled_at,
                u.first_name, u.last_name
         FROM enrollments e
         JOIN students s ON s.id = e.student_id
         JOIN users u ON u.id = s.user_id
         WHERE e.group_id = $1
         ORDER BY u.last_name, u.first_name",
    )
    .bind(group_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Enrollment>, sqlx::Error> {
    sqlx::query_as::<_, Enrollment>(&format!(
        "SELECT {COLUMNS} FROM enrollments WHERE student_id = $1 ORDER BY enrolled_at DESC"
    ))
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_status(
    pool: &PgPool,
    id: &str,
    status: EnrollmentStatus,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE enrollments SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Checks that every id in the batch is an enrollment of the given group.
/// Returns the ids that are NOT (empty when the batch is consistent).
pub(crate) async fn ids_outside_group(
    pool: &PgPool,
    group_id: &str,
    enrollment_ids: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let known = sqlx::query_scalar::<_, String>(
        "SELECT id FROM enrollments WHERE group_id = $1 AND id = ANY($2)",
    )
    .bind(group_id)
    .bind(enrollment_ids)
    .fetch_all(pool)
    .await?;

    Ok(enrollment_ids.iter().filter(|id| !known.contains(id)).cloned().collect())
}
