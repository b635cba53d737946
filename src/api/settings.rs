use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::settings::{SettingResponse, SettingUpdate};
use crate::services::academic;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_settings))
        .route("/:key", get(get_setting).put(put_setting))
}

/// Stored settings plus injected defaults. CURRENT_PERIOD always reflects
/// the calendar computation, GRADES_OPEN defaults to "true" when unset.
async fn list_settings(
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SettingResponse>>, ApiError> {
    let stored = repositories::settings::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list settings"))?;

    let mut responses: Vec<SettingResponse> = Vec::with_capacity(stored.len() + 2);
    let mut has_grades_open = false;

    for setting in stored {
        if setting.key == academic::CURRENT_PERIOD {
            // Stored rows for the computed key are ignored, never served.
            continue;
        }
        if setting.key == academic::GRADES_OPEN {
            has_grades_open = true;
        }
        responses.push(SettingResponse::from_db(setting));
    }

    if !has_grades_open {
        responses.push(SettingResponse::injected(
            academic::GRADES_OPEN,
            academic::default_for_key(academic::GRADES_OPEN).unwrap_or_default(),
        ));
    }
    responses.push(SettingResponse::injected(
        academic::CURRENT_PERIOD,
        academic::current_period().to_string(),
    ));

    responses.sort_by(|a, b| a.key.cmp(&b.key));

    Ok(Json(responses))
}

async fn get_setting(
    Path(key): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SettingResponse>, ApiError> {
    if academic::is_computed_key(&key) {
        return Ok(Json(SettingResponse::injected(
            &key,
            academic::current_period().to_string(),
        )));
    }

    let stored = repositories::settings::find_by_key(state.db(), &key)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch setting"))?;

    if let Some(setting) = stored {
        return Ok(Json(SettingResponse::from_db(setting)));
    }

    match academic::default_for_key(&key) {
        Some(value) => Ok(Json(SettingResponse::injected(&key, value))),
        None => Err(ApiError::NotFound(format!("Setting '{key}' not found"))),
    }
}

async fn put_setting(
    Path(key): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SettingUpdate>,
) -> Result<Json<SettingResponse>, ApiError> {
    // The computed key would silently shadow any stored value, so writing
    // it is rejected outright instead of accepted and ignored.
    if academic::is_computed_key(&key) {
        return Err(ApiError::BadRequest(format!(
            "Setting '{key}' is computed from the calendar and cannot be stored"
        )));
    }

    let setting =
        repositories::settings::upsert(state.db(), &key, payload.value.trim(), primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to store setting"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        key = %setting.key,
        action = "setting_update",
        "Setting updated"
    );

    Ok(Json(SettingResponse::from_db(setting)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::services::academic;
    use crate::test_support;

    #[tokio::test]
    async fn defaults_are_injected_when_storage_is_empty() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "setadmin", "Set", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(Method::GET, "/api/v1/settings", Some(&token), None))
            .await
            .expect("list settings");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");

        let settings = body.as_array().unwrap();
        let grades_open =
            settings.iter().find(|s| s["key"] == "GRADES_OPEN").expect("GRADES_OPEN");
        assert_eq!(grades_open["value"], "true");

        let period = settings.iter().find(|s| s["key"] == "CURRENT_PERIOD").expect("period");
        assert_eq!(period["value"], academic::current_period().to_string());
    }

    #[tokio::test]
    async fn current_period_cannot_be_written() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "setadmin2", "Set", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                "/api/v1/settings/CURRENT_PERIOD",
                Some(&token),
                Some(json!({"value": "1"})),
            ))
            .await
            .expect("put computed setting");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn settings_write_requires_admin() {
        let ctx = test_support::setup_test_context().await;

        let user = test_support::insert_user_with_roles(
            ctx.state.db(),
            "plainset",
            "plainset@example.com",
            "Plain",
            "Set",
            "plain-pass-2",
            &[crate::db::types::RoleName::Teacher],
        )
        .await;
        let token = test_support::bearer_token_for(&user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                "/api/v1/settings/GRADES_OPEN",
                Some(&token),
                Some(json!({"value": "false"})),
            ))
            .await
            .expect("put setting");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Reads are fine for any authenticated user.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/settings/GRADES_OPEN",
                Some(&token),
                None,
            ))
            .await
            .expect("get setting");
        assert_eq!(response.status(), StatusCode::OK);
    }
}
