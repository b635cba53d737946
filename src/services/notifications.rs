use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::Notification;
use crate::db::types::{NotificationKind, RoleName};
use crate::repositories;

pub(crate) async fn notify_user(
    pool: &PgPool,
    user_id: &str,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<Notification, sqlx::Error> {
    repositories::notifications::insert_one(pool, user_id, title, message, kind, primitive_now_utc())
        .await
}

pub(crate) async fn notify_users(
    pool: &PgPool,
    user_ids: &[String],
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<u64, sqlx::Error> {
    repositories::notifications::insert_many(
        pool,
        user_ids,
        title,
        message,
        kind,
        primitive_now_utc(),
    )
    .await
}

/// Resolves the role name to its row and fans one notification out to
/// every active holder. A role with zero members is not an error: the
/// count is simply 0.
pub(crate) async fn broadcast_to_role(
    pool: &PgPool,
    role: RoleName,
    title: &str,
    message: &str,
    kind: NotificationKind,
) -> Result<u64, sqlx::Error> {
    let Some(role_row) = repositories::roles::find_by_name(pool, role).await? else {
        return Ok(0);
    };

    let user_ids = repositories::roles::list_user_ids_for_role(pool, &role_row.id).await?;
    notify_users(pool, &user_ids, title, message, kind).await
}
