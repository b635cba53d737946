use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::User;
use crate::db::types::RoleName;

const COLUMNS: &str = "\
    id, email, username, hashed_password, first_name, last_name, phone, \
    is_active, email_verified, created_at, updated_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Login lookup: the identifier may be either a username or an email.
pub(crate) async fn find_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {COLUMNS} FROM users WHERE username = $1 OR email = $1"
    ))
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn exists_by_email_or_username(
    pool: &PgPool,
    email: &str,
    username: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("SELECT id FROM users WHERE email = $1 OR username = $2")
        .bind(email)
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub(crate) struct CreateUser<'a> {
    pub(crate) id: &'a str,
    pub(crate) email: &'a str,
    pub(crate) username: &'a str,
    pub(crate) hashed_password: Option<String>,
    pub(crate) first_name: &'a str,
    pub(crate) last_name: &'a str,
    pub(crate) phone: Option<&'a str>,
    pub(crate) is_active: bool,
    pub(crate) email_verified: bool,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (
            id, email, username, hashed_password, first_name, last_name, phone,
            is_active, email_verified, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.email)
    .bind(params.username)
    .bind(params.hashed_password)
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.phone)
    .bind(params.is_active)
    .bind(params.email_verified)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateUser {
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
    pub(crate) phone: Option<String>,
    pub(crate) is_active: Option<bool>,
    pub(crate) email_verified: Option<bool>,
    pub(crate) hashed_password: Option<String>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(pool: &PgPool, id: &str, params: UpdateUser) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET
            first_name = COALESCE($1, first_name),
            last_name = COALESCE($2, last_name),
            phone = COALESCE($3, phone),
            is_active = COALESCE($4, is_active),
            email_verified = COALESCE($5, email_verified),
            hashed_password = COALESCE($6, hashed_password),
            updated_at = $7
         WHERE id = $8",
    )
    .bind(params.first_name)
    .bind(params.last_name)
    .bind(params.phone)
    .bind(params.is_active)
    .bind(params.email_verified)
    .bind(params.hashed_password)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn set_password(
    pool: &PgPool,
    id: &str,
    hashed_password: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET hashed_password = $1, updated_at = $2 WHERE id = $3")
        .bind(hashed_password)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) struct UserListFilter {
    pub(crate) role: Option<RoleName>,
    pub(crate) is_active: Option<bool>,
    pub(crate) search: Option<String>,
    pub(crate) skip: i64,
    pub(crate) limit: i64,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: UserListFilter,
) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM users u"));

    if let Some(role) = filter.role {
        builder.push(
            " WHERE EXISTS (
                SELECT 1 FROM user_roles ur
                JOIN roles r ON r.id = ur.role_id
                WHERE ur.user_id = u.id AND r.name = ",
        );
        builder.push_bind(role);
        builder.push(")");
    } else {
        builder.push(" WHERE TRUE");
    }

    if let Some(is_active) = filter.is_active {
        builder.push(" AND u.is_active = ");
        builder.push_bind(is_active);
    }
    if let Some(search) = filter.search.as_ref() {
        let pattern = format!("%{}%", search.trim());
        builder.push(" AND (u.first_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR u.last_name ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR u.email ILIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }

    builder.push(" ORDER BY u.created_at DESC");
    builder.push(" OFFSET ");
    builder.push_bind(filter.skip.max(0));
    builder.push(" LIMIT ");
    builder.push_bind(filter.limit.clamp(1, 1000));

    builder.build_query_as::<User>().fetch_all(pool).await
}
