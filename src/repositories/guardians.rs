use sqlx::PgPool;

use crate::db::models::Guardian;

const COLUMNS: &str = "id, user_id, phone, created_at, updated_at";

pub(crate) struct CreateGuardian<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) phone: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateGuardian<'_>,
) -> Result<Guardian, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(&format!(
        "INSERT INTO guardians (id, user_id, phone, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.phone)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Guardian>, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(&format!("SELECT {COLUMNS} FROM guardians WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_user_id(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<Guardian>, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(&format!("SELECT {COLUMNS} FROM guardians WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Guardian>, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(&format!(
        "SELECT {COLUMNS} FROM guardians ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn update_phone(
    pool: &PgPool,
    id: &str,
    phone: Option<&str>,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE guardians SET phone = $1, updated_at = $2 WHERE id = $3")
        .bind(phone)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
