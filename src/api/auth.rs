use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::validation::validate_password_len;
use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::auth::{ChangePasswordRequest, LoginRequest, TokenResponse};
use crate::schemas::user::UserResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/change-password", post(change_password))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let identifier = payload.identifier.trim();
    if identifier.is_empty() || payload.password.is_empty() {
        return Err(ApiError::BadRequest("Identifier and password are required".to_string()));
    }

    // Every failure path returns the same message so a probe cannot tell
    // which field was wrong.
    const BAD_CREDENTIALS: &str = "Incorrect identifier or password";

    let user = repositories::users::find_by_identifier(state.db(), identifier)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or(ApiError::Unauthorized(BAD_CREDENTIALS))?;

    let Some(hash) = user.hashed_password.as_deref() else {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    };

    let verified = security::verify_password(&payload.password, hash)
        .map_err(|_| ApiError::Unauthorized(BAD_CREDENTIALS))?;

    if !verified || !user.is_active {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS));
    }

    let roles = repositories::roles::list_for_user(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user roles"))?;
    let role_names: Vec<String> =
        roles.iter().map(|role| role.as_str().to_string()).collect();

    let token =
        security::create_access_token(&user.id, &user.email, &role_names, state.settings(), None)
            .map_err(|e| ApiError::internal(e, "Failed to create access token"))?;

    tracing::info!(user_id = %user.id, action = "login", "User logged in");

    Ok(Json(TokenResponse {
        token,
        token_type: "bearer".to_string(),
        user: UserResponse::from_db(user, roles),
    }))
}

async fn me(CurrentUser(auth): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from_db(auth.user, auth.roles))
}

async fn change_password(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<axum::http::StatusCode, ApiError> {
    validate_password_len(&payload.new_password)?;

    let Some(hash) = auth.user.hashed_password.as_deref() else {
        return Err(ApiError::BadRequest("Account has no password set".to_string()));
    };

    let verified = security::verify_password(&payload.current_password, hash)
        .map_err(|e| ApiError::internal(e, "Failed to verify password"))?;
    if !verified {
        return Err(ApiError::Unauthorized("Current password is incorrect"));
    }

    let new_hash = security::hash_password(&payload.new_password)
        .map_err(|e| ApiError::internal(e, "Failed to hash password"))?;

    repositories::users::set_password(state.db(), &auth.user.id, &new_hash, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update password"))?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::db::types::RoleName;
    use crate::test_support;

    #[tokio::test]
    async fn login_succeeds_with_username_or_email() {
        let ctx = test_support::setup_test_context().await;

        let user = test_support::insert_user_with_roles(
            ctx.state.db(),
            "mgarcia",
            "mgarcia@example.com",
            "Maria",
            "Garcia",
            "teacher-pass-1",
            &[RoleName::Teacher],
        )
        .await;

        for identifier in ["mgarcia", "mgarcia@example.com"] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/auth/login",
                    None,
                    Some(json!({"identifier": identifier, "password": "teacher-pass-1"})),
                ))
                .await
                .expect("login");

            let status = response.status();
            let body = test_support::read_json(response).await;
            assert_eq!(status, StatusCode::OK, "response: {body}");
            assert!(body["token"].as_str().is_some());
            assert_eq!(body["user"]["id"], user.id.as_str());
            assert_eq!(body["user"]["roles"][0], "TEACHER");
        }
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_generic_401() {
        let ctx = test_support::setup_test_context().await;

        test_support::insert_user_with_roles(
            ctx.state.db(),
            "jlopez",
            "jlopez@example.com",
            "Juan",
            "Lopez",
            "student-pass-1",
            &[RoleName::Student],
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"identifier": "jlopez", "password": "not-the-password"})),
            ))
            .await
            .expect("login");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        // Same message as an unknown identifier: no field is singled out.
        assert_eq!(body["message"], "Incorrect identifier or password");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"identifier": "nobody", "password": "whatever-pass"})),
            ))
            .await
            .expect("login");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Incorrect identifier or password");
    }

    #[tokio::test]
    async fn login_without_password_hash_is_rejected() {
        let ctx = test_support::setup_test_context().await;

        test_support::insert_passwordless_user(
            ctx.state.db(),
            "pending",
            "pending@example.com",
            "Pen",
            "Ding",
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({"identifier": "pending", "password": "any-password"})),
            ))
            .await
            .expect("login");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_requires_bearer_token() {
        let ctx = test_support::setup_test_context().await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/auth/me", None, None))
            .await
            .expect("me");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/auth/me",
                Some("not-a-jwt"),
                None,
            ))
            .await
            .expect("me");
        // Malformed signature on a present token: forbidden, not unauthorized.
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
