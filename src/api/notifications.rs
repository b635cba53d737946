use axum::extract::{Path, Query, State};
use axum::{routing::get, routing::patch, routing::post, Json, Router};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::db::types::RoleName;
use crate::repositories;
use crate::schemas::notification::{
    MarkAllReadResponse, NotificationResponse, SendNotificationRequest, SendNotificationResponse,
    UnreadCountResponse,
};
use crate::services::notifications;

#[derive(Debug, Deserialize)]
pub(crate) struct NotificationListQuery {
    #[serde(default)]
    #[serde(alias = "unreadOnly")]
    unread_only: bool,
    #[serde(default = "default_limit")]
    limit: i64,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/send", post(send))
        .route("/read-all", patch(mark_all_read))
        .route("/:notification_id/read", patch(mark_read))
}

async fn list_notifications(
    Query(params): Query<NotificationListQuery>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationResponse>>, ApiError> {
    let notifications = repositories::notifications::list_for_user(
        state.db(),
        &auth.user.id,
        params.unread_only,
        params.limit,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;

    Ok(Json(notifications.into_iter().map(NotificationResponse::from_db).collect()))
}

async fn unread_count(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<UnreadCountResponse>, ApiError> {
    let count = repositories::notifications::unread_count(state.db(), &auth.user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count notifications"))?;

    Ok(Json(UnreadCountResponse { count }))
}

async fn send(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SendNotificationRequest>,
) -> Result<Json<SendNotificationResponse>, ApiError> {
    if payload.title.trim().is_empty() || payload.message.trim().is_empty() {
        return Err(ApiError::BadRequest("title and message are required".to_string()));
    }

    let targets = [
        payload.user_id.is_some(),
        payload.role.is_some(),
        payload.user_ids.is_some(),
    ];
    if targets.iter().filter(|present| **present).count() != 1 {
        return Err(ApiError::BadRequest(
            "Provide exactly one of user_id, role or user_ids".to_string(),
        ));
    }

    let count = if let Some(user_id) = payload.user_id.as_deref() {
        let user = repositories::users::find_by_id(state.db(), user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;
        if user.is_none() {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        notifications::notify_user(state.db(), user_id, &payload.title, &payload.message, payload.kind)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to send notification"))?;
        1
    } else if let Some(role_name) = payload.role.as_deref() {
        // An unknown role name is a 404; a known role with zero members
        // is a successful no-op.
        let role = RoleName::parse(role_name)
            .ok_or_else(|| ApiError::NotFound(format!("Role '{role_name}' not found")))?;

        notifications::broadcast_to_role(
            state.db(),
            role,
            &payload.title,
            &payload.message,
            payload.kind,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to broadcast notification"))?
    } else {
        let user_ids = payload.user_ids.clone().unwrap_or_default();
        notifications::notify_users(
            state.db(),
            &user_ids,
            &payload.title,
            &payload.message,
            payload.kind,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to send notifications"))?
    };

    tracing::info!(
        admin_id = %admin.user.id,
        count,
        action = "notification_send",
        "Notifications sent"
    );

    Ok(Json(SendNotificationResponse { count }))
}

/// Ownership is enforced by the user_id predicate: a foreign id looks
/// exactly like a missing one, so existence does not leak.
async fn mark_read(
    Path(notification_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let updated =
        repositories::notifications::mark_read(state.db(), &notification_id, &auth.user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to mark notification read"))?;

    if updated == 0 {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn mark_all_read(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<MarkAllReadResponse>, ApiError> {
    let updated = repositories::notifications::mark_all_read(state.db(), &auth.user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notifications read"))?;

    Ok(Json(MarkAllReadResponse { updated }))
}

fn default_limit() -> i64 {
    50
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::db::types::RoleName;
    use crate::test_support;

    #[tokio::test]
    async fn broadcast_to_empty_role_returns_zero() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "notifadmin", "Not", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        // No teacher exists yet: the broadcast is a no-op, not an error.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/notifications/send",
                Some(&token),
                Some(json!({"role": "TEACHER", "title": "x", "message": "y"})),
            ))
            .await
            .expect("broadcast");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["count"], 0);
    }

    #[tokio::test]
    async fn unknown_role_is_404() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "notifadmin2", "Not", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/notifications/send",
                Some(&token),
                Some(json!({"role": "WIZARD", "title": "x", "message": "y"})),
            ))
            .await
            .expect("broadcast");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mark_read_hides_foreign_notifications_as_404() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "notifadmin3", "Not", "Admin").await;
        let admin_token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let owner = test_support::insert_user_with_roles(
            ctx.state.db(),
            "owner",
            "owner@example.com",
            "Own",
            "Er",
            "owner-pass-1",
            &[RoleName::Student],
        )
        .await;
        let other = test_support::insert_user_with_roles(
            ctx.state.db(),
            "other",
            "otheruser@example.com",
            "Oth",
            "Er",
            "other-pass-1",
            &[RoleName::Student],
        )
        .await;

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/notifications/send",
                Some(&admin_token),
                Some(json!({"user_id": owner.id, "title": "hello", "message": "world"})),
            ))
            .await
            .expect("send");
        assert_eq!(response.status(), StatusCode::OK);

        let owner_token = test_support::bearer_token_for(&owner, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/notifications",
                Some(&owner_token),
                None,
            ))
            .await
            .expect("list");
        let body = test_support::read_json(response).await;
        let notification_id = body[0]["id"].as_str().expect("notification id").to_string();

        // The other user sees 404, not 403.
        let other_token = test_support::bearer_token_for(&other, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PATCH,
                &format!("/api/v1/notifications/{notification_id}/read"),
                Some(&other_token),
                None,
            ))
            .await
            .expect("mark read as other");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PATCH,
                &format!("/api/v1/notifications/{notification_id}/read"),
                Some(&owner_token),
                None,
            ))
            .await
            .expect("mark read as owner");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/notifications/unread-count",
                Some(&owner_token),
                None,
            ))
            .await
            .expect("unread count");
        let body = test_support::read_json(response).await;
        assert_eq!(body["count"], 0);
    }
}
