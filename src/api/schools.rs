use axum::extract::{Path, Query, State};
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::school::{
    AgreementResponse, SchoolCreate, SchoolDetailResponse, SchoolResponse, SchoolUpdate,
};

#[derive(Debug, Deserialize)]
pub(crate) struct SchoolListQuery {
    #[serde(default)]
    #[serde(alias = "includeInactive")]
    include_inactive: bool,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schools).post(create_school))
        .route("/:school_id", get(get_school).patch(update_school).delete(delete_school))
        .route("/:school_id/agreements/:agreement_id", post(link_agreement).delete(unlink_agreement))
}

async fn list_schools(
    Query(params): Query<SchoolListQuery>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SchoolResponse>>, ApiError> {
    let schools = repositories::schools::list(state.db(), params.include_inactive)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list schools"))?;

    Ok(Json(schools.into_iter().map(SchoolResponse::from_db).collect()))
}

async fn get_school(
    Path(school_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SchoolDetailResponse>, ApiError> {
    let school = repositories::schools::find_by_id(state.db(), &school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?;

    let Some(school) = school else {
        return Err(ApiError::NotFound("School not found".to_string()));
    };

    let agreements = repositories::schools::list_agreements(state.db(), &school.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list school agreements"))?;

    Ok(Json(SchoolDetailResponse {
        school: SchoolResponse::from_db(school),
        agreements: agreements.into_iter().map(AgreementResponse::from_db).collect(),
    }))
}

async fn create_school(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SchoolCreate>,
) -> Result<(axum::http::StatusCode, Json<SchoolResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let sie_code = payload.sie_code.trim();
    let existing = repositories::schools::exists_by_sie_code(state.db(), sie_code)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check SIE code"))?;

    // Unique-constraint conflicts surface as 400 with a specific message.
    if existing.is_some() {
        return Err(ApiError::BadRequest(format!(
            "A school with SIE code '{sie_code}' already exists"
        )));
    }

    let now = primitive_now_utc();
    let school = repositories::schools::create(
        state.db(),
        repositories::schools::CreateSchool {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            sie_code,
            address: payload.address.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create school"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        school_id = %school.id,
        action = "school_create",
        "School created"
    );

    Ok((axum::http::StatusCode::CREATED, Json(SchoolResponse::from_db(school))))
}

async fn update_school(
    Path(school_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<SchoolUpdate>,
) -> Result<Json<SchoolResponse>, ApiError> {
    let school = repositories::schools::find_by_id(state.db(), &school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?;

    let Some(school) = school else {
        return Err(ApiError::NotFound("School not found".to_string()));
    };

    if let Some(sie_code) = payload.sie_code.as_deref() {
        let existing = repositories::schools::exists_by_sie_code(state.db(), sie_code.trim())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check SIE code"))?;
        if let Some(owner) = existing {
            if owner != school.id {
                return Err(ApiError::BadRequest(format!(
                    "A school with SIE code '{}' already exists",
                    sie_code.trim()
                )));
            }
        }
    }

    repositories::schools::update(
        state.db(),
        &school.id,
        repositories::schools::UpdateSchool {
            name: payload.name,
            sie_code: payload.sie_code.map(|code| code.trim().to_string()),
            address: payload.address,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update school"))?;

    let updated = repositories::schools::find_by_id(state.db(), &school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated school"))?
        .ok_or_else(|| ApiError::NotFound("School not found".to_string()))?;

    Ok(Json(SchoolResponse::from_db(updated)))
}

/// Soft delete: the school stays on file with is_active = false.
async fn delete_school(
    Path(school_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let deactivated = repositories::schools::deactivate(state.db(), &school_id, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to deactivate school"))?;

    if deactivated == 0 {
        return Err(ApiError::NotFound("School not found".to_string()));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn link_agreement(
    Path((school_id, agreement_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let school = repositories::schools::find_by_id(state.db(), &school_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?;
    if school.is_none() {
        return Err(ApiError::NotFound("School not found".to_string()));
    }

    let agreement = repositories::agreements::find_by_id(state.db(), &agreement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch agreement"))?;
    if agreement.is_none() {
        return Err(ApiError::NotFound("Agreement not found".to_string()));
    }

    repositories::schools::link_agreement(state.db(), &school_id, &agreement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to link agreement"))?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn unlink_agreement(
    Path((school_id, agreement_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let removed = repositories::schools::unlink_agreement(state.db(), &school_id, &agreement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unlink agreement"))?;

    if removed == 0 {
        return Err(ApiError::NotFound("Agreement link not found".to_string()));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn duplicate_sie_code_is_a_specific_400() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "schooladmin", "Sch", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/schools",
                Some(&token),
                Some(json!({"name": "Colegio Norte", "sie_code": "SIE-001"})),
            ))
            .await
            .expect("create school");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/schools",
                Some(&token),
                Some(json!({"name": "Colegio Sur", "sie_code": "SIE-001"})),
            ))
            .await
            .expect("create duplicate school");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "A school with SIE code 'SIE-001' already exists");
    }

    #[tokio::test]
    async fn delete_is_a_soft_delete() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "schooladmin2", "Sch", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/schools",
                Some(&token),
                Some(json!({"name": "Colegio Este", "sie_code": "SIE-002"})),
            ))
            .await
            .expect("create school");
        let created = test_support::read_json(response).await;
        let school_id = created["id"].as_str().expect("school id").to_string();

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::DELETE,
                &format!("/api/v1/schools/{school_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("delete school");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/schools/{school_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("get school");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["is_active"], false);
    }
}
