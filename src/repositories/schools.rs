use sqlx::PgPool;

use crate::db::models::{Agreement, School};

const COLUMNS: &str = "id, name, sie_code, address, is_active, created_at, updated_at";

pub(crate) struct CreateSchool<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) sie_code: &'a str,
    pub(crate) address: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateSchool<'_>) -> Result<School, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!(
        "INSERT INTO schools (id, name, sie_code, address, is_active, created_at, updated_at)
         VALUES ($1,$2,$3,$4,TRUE,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.sie_code)
    .bind(params.address)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<School>, sqlx::Error> {
    sqlx::query_as::<_, School>(&format!("SELECT {COLUMNS} FROM schools WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn exists_by_sie_code(
    pool: &PgPool,
    sie_code: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM schools WHERE sie_code = $1")
        .bind(sie_code)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool, include_inactive: bool) -> Result<Vec<School>, sqlx::Error> {
    let sql = if include_inactive {
        format!("SELECT {COLUMNS} FROM schools ORDER BY name")
    } else {
        format!("SELECT {COLUMNS} FROM schools WHERE is_active = TRUE ORDER BY name")
    };
    sqlx::query_as::<_, School>(&sql).fetch_all(pool).await
}

pub(crate) struct UpdateSchool {
    pub(crate) name: Option<String>,
    pub(crate) sie_code: Option<String>,
    pub(crate) address: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateSchool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE schools SET
            name = COALESCE($1, name),
            sie_code = COALESCE($2, sie_code),
            address = COALESCE($3, address),
            is_active = COALESCE($4, is_active),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.name)
    .bind(params.sie_code)
    .bind(params.address)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn deactivate(
    pool: &PgPool,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE schools SET is_active = FALSE, updated_at = $1 WHERE id = $2")
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn link_agreement(
    pool: &PgPool,
    school_id: &str,
    agreement_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO school_agreements (school_id, agreement_id)
         VALUES ($1, $2)
         ON CONFLICT (school_id, agreement_id) DO NOTHING",
    )
    .bind(school_id)
    .bind(agreement_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn unlink_agreement(
    pool: &PgPool,
    school_id: &str,
    agreement_id: &str,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM school_agreements WHERE school_id = $1 AND agreement_id = $2")
            .bind(school_id)
            .bind(agreement_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_agreements(
    pool: &PgPool,
    school_id: &str,
) -> Result<Vec<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(
        "SELECT a.id, a.name, a.discount_percent, a.description, a.is_active,
                a.created_at, a.updated_at
         FROM agreements a
         JOIN school_agreements sa ON sa.agreement_id = a.id
         WHERE sa.school_id = $1 AND a.is_active = TRUE
         ORDER BY a.discount_percent DESC",
    )
    .bind(school_id)
    .fetch_all(pool)
    .await
}

/// Best active discount for the student's partner school, if any.
pub(crate) async fn best_discount_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Option<f64>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<f64>>(
        "SELECT MAX(a.discount_percent)
         FROM students s
         JOIN schools sc ON sc.id = s.school_id AND sc.is_active = TRUE
         JOIN school_agreements sa ON sa.school_id = sc.id
         JOIN agreements a ON a.id = sa.agreement_id AND a.is_active = TRUE
         WHERE s.id = $1",
    )
    .bind(student_id)
    .fetch_one(pool)
    .await
}
