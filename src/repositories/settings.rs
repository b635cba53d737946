use sqlx::PgPool;

use crate::db::models::SystemSetting;

pub(crate) async fn find_by_key(
    pool: &PgPool,
    key: &str,
) -> Result<Option<SystemSetting>, sqlx::Error> {
    sqlx::query_as::<_, SystemSetting>(
        "SELECT key, value, updated_at FROM system_settings WHERE key = $1",
    )
    .bind(key)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<SystemSetting>, sqlx::Error> {
    sqlx::query_as::<_, SystemSetting>(
        "SELECT key, value, updated_at FROM system_settings ORDER BY key",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn upsert(
    pool: &PgPool,
    key: &str,
    value: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<SystemSetting, sqlx::Error> {
    sqlx::query_as::<_, SystemSetting>(
        "INSERT INTO system_settings (key, value, updated_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (key)
         DO UPDATE SET value = EXCLUDED.value, updated_at = EXCLUDED.updated_at
         RETURNING key, value, updated_at",
    )
    .bind(key)
    .bind(value)
    .bind(updated_at)
    .fetch_one(pool)
    .await
}
