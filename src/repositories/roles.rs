use sqlx::PgPool;

use crate::db::models::Role;
use crate::db::types::RoleName;

pub(crate) async fn find_by_name(
    pool: &PgPool,
    name: RoleName,
) -> Result<Option<Role>, sqlx::Error> {
    sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: &str,
) -> Result<Vec<RoleName>, sqlx::Error> {
    sqlx::query_scalar::<_, RoleName>(
        "SELECT r.name
         FROM user_roles ur
         JOIN roles r ON r.id = ur.role_id
         WHERE ur.user_id = $1
         ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn assign(
    pool: &PgPool,
    user_id: &str,
    role: RoleName,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id)
         SELECT $1, id FROM roles WHERE name = $2
         ON CONFLICT (user_id, role_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(role)
    .execute(pool)
    .await?;
    Ok(())
}

/// Atomically replaces the user's role assignment set.
pub(crate) async fn replace_for_user(
    pool: &PgPool,
    user_id: &str,
    roles: &[RoleName],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for role in roles {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id)
             SELECT $1, id FROM roles WHERE name = $2
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Active holders of the role, by role id.
pub(crate) async fn list_user_ids_for_role(
    pool: &PgPool,
    role_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT ur.user_id
         FROM user_roles ur
         JOIN users u ON u.id = ur.user_id
         WHERE ur.role_id = $1 AND u.is_active = TRUE",
    )
    .bind(role_id)
    .fetch_all(pool)
    .await
}
