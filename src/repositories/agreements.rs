use sqlx::PgPool;

use crate::db::models::Agreement;

const COLUMNS: &str = "id, name, discount_percent, description, is_active, created_at, updated_at";

pub(crate) struct CreateAgreement<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) discount_percent: f64,
    pub(crate) description: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAgreement<'_>,
) -> Result<Agreement, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(&format!(
        "INSERT INTO agreements (id, name, discount_percent, description, is_active, created_at, updated_at)
         VALUES ($1,$2,$3,$4,TRUE,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.discount_percent)
    .bind(params.description)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Agreement>, sqlx::Error> {
    sqlx::query_as::<_, Agreement>(&format!("SELECT {COLUMNS} FROM agreements WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    include_inactive: bool,
) -> Result<Vec<Agreement>, sqlx::Error> {
    let sql = if include_inactive {
        format!("SELECT {COLUMNS} FROM agreements ORDER BY name")
    } else {
        format!("SELECT {COLUMNS} FROM agreements WHERE is_active = TRUE ORDER BY name")
    };
    sqlx::query_as::<_, Agreement>(&sql).fetch_all(pool).await
}

pub(crate) struct UpdateAgreement {
    pub(crate) name: Option<String>,
    pub(crate) discount_percent: Option<f64>,
    pub(crate) description: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateAgreement,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE agreements SET
            name = COALESCE($1, name),
            discount_percent = COALESCE($2, discount_percent),
            description = COALESCE($3, description),
            is_active = COALESCE($4, is_active),
            updated_at = $5
         WHERE id = $6",
    )
    .bind(params.name)
    .bind(params.discount_percent)
    .bind(params.description)
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
    let result =
        sqlx::query("UPDATE agreements SET is_active = FALSE, updated_at = $1 WHERE id = $2")
            .bind(updated_at)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
