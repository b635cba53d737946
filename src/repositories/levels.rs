use sqlx::PgPool;

use crate::db::models::Level;

const COLUMNS: &str = "id, course_id, name, level_order, base_price, created_at, updated_at";

pub(crate) struct CreateLevel<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) level_order: i32,
    pub(crate) base_price: f64,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateLevel<'_>) -> Result<Level, sqlx::Error> {
    sqlx::query_as::<_, Level>(&format!(
        "INSERT INTO levels (id, course_id, name, level_order, base_price, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_id)
    .bind(params.name)
    .bind(params.level_order)
    .bind(params.base_price)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Level>, sqlx::Error> {
    sqlx::query_as::<_, Level>(&format!("SELECT {COLUMNS} FROM levels WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_course(
    pool: &PgPool,
    course_id: &str,
) -> Result<Vec<Level>, sqlx::Error> {
    sqlx::query_as::<_, Level>(&format!(
        "SELECT {COLUMNS} FROM levels WHERE course_id = $1 ORDER BY level_order"
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_order(
    pool: &PgPool,
    course_id: &str,
    level_order: i32,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT id FROM levels WHERE course_id = $1 AND level_order = $2",
    )
    .bind(course_id)
    .bind(level_order)
    .fetch_optional(pool)
    .await
}

pub(crate) struct UpdateLevel {
    pub(crate) name: Option<String>,
    pub(crate) base_price: Option<f64>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateLevel,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE levels SET
            name = COALESCE($1, name),
            base_price = COALESCE($2, base_price),
            updated_at = $3
         WHERE id = $4",
    )
    .bind(params.name)
    .bind(params.base_price)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM levels WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}

pub(crate) async fn count_groups(pool: &PgPool, level_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM groups WHERE level_id = $1")
        .bind(level_id)
        .fetch_one(pool)
        .await
}
