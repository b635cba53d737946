use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Notification;
use crate::db::types::NotificationKind;

const COLUMNS: &str = "id, user_id, title, message, kind, is_read, created_at";

pub(crate) async fn insert_one(
    pool: &PgPool,
    user_id: &str,
    title: &str,
    message: &str,
    kind: NotificationKind,
    created_at: time::PrimitiveDateTime,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
         VALUES ($1,$2,$3,$4,$5,FALSE,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(title)
    .bind(message)
    .bind(kind)
    .bind(created_at)
    .fetch_one(pool)
    .await
}

/// One row per recipient, inserted in a single statement. Returns the
/// inserted count; an empty recipient list inserts nothing.
pub(crate) async fn insert_many(
    pool: &PgPool,
    user_ids: &[String],
    title: &str,
    message: &str,
    kind: NotificationKind,
    created_at: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    if user_ids.is_empty() {
        return Ok(0);
    }

    let ids: Vec<String> = user_ids.iter().map(|_| Uuid::new_v4().to_string()).collect();

    let result = sqlx::query(
        "INSERT INTO notifications (id, user_id, title, message, kind, is_read, created_at)
         SELECT new_id, recipient, $3, $4, $5, FALSE, $6
         FROM UNNEST($1::text[], $2::text[]) AS pairs(new_id, recipient)",
    )
    .bind(&ids)
    .bind(user_ids)
    .bind(title)
    .bind(message)
    .bind(kind)
    .bind(created_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<Notification>, sqlx::Error> {
    let sql = if unread_only {
        format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1 AND is_read = FALSE
             ORDER BY created_at DESC LIMIT $2"
        )
    } else {
        format!(
            "SELECT {COLUMNS} FROM notifications
             WHERE user_id = $1
             ORDER BY created_at DESC LIMIT $2"
        )
    };

    sqlx::query_as::<_, Notification>(&sql)
        .bind(user_id)
        .bind(limit.clamp(1, 500))
        .fetch_all(pool)
        .await
}

pub(crate) async fn unread_count(pool: &PgPool, user_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = FALSE",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// The user_id predicate doubles as the ownership check: a foreign
/// notification id affects zero rows.
pub(crate) async fn mark_read(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn mark_all_read(pool: &PgPool, user_id: &str) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND is_read = FALSE")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
