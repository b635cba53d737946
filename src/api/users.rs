use axum::extract::{Path, Query, State};
use axum::{routing::get, routing::put, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::validation::validate_password_len;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::RoleName;
use crate::repositories;
use crate::schemas::user::{AdminUserCreate, AdminUserUpdate, ReplaceRolesRequest, UserResponse};

#[derive(Debug, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    skip: i64,
    #[serde(default = "default_limit")]
    limit: i64,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    #[serde(alias = "isActive")]
    is_active: Option<bool>,
    #[serde(default)]
    search: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:user_id", get(get_user).patch(update_user))
        .route("/:user_id/roles", put(replace_roles))
}

async fn list_users(
    Query(params): Query<UserListQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let role = match params.role.as_deref() {
        Some(raw) => Some(
            RoleName::parse(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Unknown role '{raw}'")))?,
        ),
        None => None,
    };

    let users = repositories::users::list(
        state.db(),
        repositories::users::UserListFilter {
            role,
            is_active: params.is_active,
            search: params.search,
            skip: params.skip,
            limit: params.limit,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list users"))?;

    let mut responses = Vec::with_capacity(users.len());
    for user in users {
        let roles = repositories::roles::list_for_user(state.db(), &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;
        responses.push(UserResponse::from_db(user, roles));
    }

    Ok(Json(responses))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let roles = repositories::roles::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;

    Ok(Json(UserResponse::from_db(user, roles)))
}

async fn create_user(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserCreate>,
) -> Result<(axum::http::StatusCode, Json<UserResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let roles = parse_roles(&payload.roles)?;

    let hashed_password = match payload.password.as_deref() {
        Some(password) => {
            validate_password_len(password)?;
            Some(
                security::hash_password(password)
                    .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
            )
        }
        None => None,
    };

    let existing = repositories::users::exists_by_email_or_username(
        state.db(),
        &payload.email,
        &payload.username,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to check existing user"))?;

    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "User with this email or username already exists".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let user = repositories::users::create(
        state.db(),
        repositories::users::CreateUser {
            id: &Uuid::new_v4().to_string(),
            email: payload.email.trim(),
            username: payload.username.trim(),
            hashed_password,
            first_name: payload.first_name.trim(),
            last_name: payload.last_name.trim(),
            phone: payload.phone.as_deref(),
            is_active: payload.is_active,
            email_verified: false,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create user"))?;

    if !roles.is_empty() {
        repositories::roles::replace_for_user(state.db(), &user.id, &roles)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to assign roles"))?;
    }

    tracing::info!(
        admin_id = %admin.user.id,
        user_id = %user.id,
        action = "user_create",
        "Admin created user"
    );

    Ok((axum::http::StatusCode::CREATED, Json(UserResponse::from_db(user, roles))))
}

async fn update_user(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AdminUserUpdate>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(_user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let hashed_password = match payload.password.as_deref() {
        Some(password) => {
            validate_password_len(password)?;
            Some(
                security::hash_password(password)
                    .map_err(|e| ApiError::internal(e, "Failed to hash password"))?,
            )
        }
        None => None,
    };

    repositories::users::update(
        state.db(),
        &user_id,
        repositories::users::UpdateUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            phone: payload.phone,
            is_active: payload.is_active,
            email_verified: payload.email_verified,
            hashed_password,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update user"))?;

    let updated = repositories::users::fetch_one_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated user"))?;
    let roles = repositories::roles::list_for_user(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        user_id = %updated.id,
        action = "user_update",
        "Admin updated user"
    );

    Ok(Json(UserResponse::from_db(updated, roles)))
}

/// Replaces the whole role assignment set in one transaction.
async fn replace_roles(
    Path(user_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ReplaceRolesRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let roles = parse_roles(&payload.roles)?;

    repositories::roles::replace_for_user(state.db(), &user_id, &roles)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to replace roles"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        user_id = %user_id,
        action = "user_roles_replace",
        "Admin replaced user roles"
    );

    Ok(Json(UserResponse::from_db(user, roles)))
}

fn parse_roles(raw: &[String]) -> Result<Vec<RoleName>, ApiError> {
    let mut roles = Vec::with_capacity(raw.len());
    for name in raw {
        let role = RoleName::parse(name)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown role '{name}'")))?;
        if !roles.contains(&role) {
            roles.push(role);
        }
    }
    Ok(roles)
}

fn default_limit() -> i64 {
    100
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::db::types::RoleName;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn admin_can_create_update_and_reassign_roles() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "rootadmin", "Root", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/users",
                Some(&token),
                Some(json!({
                    "email": "ana.ruiz@example.com",
                    "username": "aruiz",
                    "password": "initial-pass-1",
                    "first_name": "Ana",
                    "last_name": "Ruiz",
                    "roles": ["TEACHER"]
                })),
            ))
            .await
            .expect("create user");

        let status = response.status();
        let created = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::CREATED, "response: {created}");
        let user_id = created["id"].as_str().expect("user id").to_string();
        assert_eq!(created["roles"][0], "TEACHER");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PATCH,
                &format!("/api/v1/users/{user_id}"),
                Some(&token),
                Some(json!({"first_name": "Ana Maria", "is_active": false})),
            ))
            .await
            .expect("update user");

        let status = response.status();
        let updated = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {updated}");
        assert_eq!(updated["first_name"], "Ana Maria");
        assert_eq!(updated["is_active"], false);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                &format!("/api/v1/users/{user_id}/roles"),
                Some(&token),
                Some(json!({"roles": ["STUDENT", "LEGAL_GUARDIAN"]})),
            ))
            .await
            .expect("replace roles");
        assert_eq!(response.status(), StatusCode::OK);

        let roles = repositories::roles::list_for_user(ctx.state.db(), &user_id)
            .await
            .expect("list roles");
        assert_eq!(roles.len(), 2);
        assert!(roles.contains(&RoleName::Student));
        assert!(roles.contains(&RoleName::LegalGuardian));
        assert!(!roles.contains(&RoleName::Teacher));
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "rootadmin2", "Root", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/users",
                Some(&token),
                Some(json!({
                    "email": "x@example.com",
                    "username": "xuser",
                    "first_name": "X",
                    "last_name": "User",
                    "roles": ["JANITOR"]
                })),
            ))
            .await
            .expect("create user");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_admin_cannot_list_users() {
        let ctx = test_support::setup_test_context().await;

        let user = test_support::insert_user_with_roles(
            ctx.state.db(),
            "plainuser",
            "plain@example.com",
            "Plain",
            "User",
            "plain-pass-1",
            &[RoleName::Student],
        )
        .await;
        let token = test_support::bearer_token_for(&user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/users", Some(&token), None))
            .await
            .expect("list users");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
