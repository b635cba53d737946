use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::school::{AgreementCreate, AgreementResponse, AgreementUpdate};

#[derive(Debug, Deserialize)]
pub(crate) struct AgreementListQuery {
    #[serde(default)]
    #[serde(alias = "includeInactive")]
    include_inactive: bool,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_agreements).post(create_agreement))
        .route("/:agreement_id", get(get_agreement).patch(update_agreement).delete(delete_agreement))
}

async fn list_agreements(
    Query(params): Query<AgreementListQuery>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AgreementResponse>>, ApiError> {
    let agreements = repositories::agreements::list(state.db(), params.include_inactive)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list agreements"))?;

    Ok(Json(agreements.into_iter().map(AgreementResponse::from_db).collect()))
}

async fn get_agreement(
    Path(agreement_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AgreementResponse>, ApiError> {
    let agreement = repositories::agreements::find_by_id(state.db(), &agreement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch agreement"))?;

    let Some(agreement) = agreement else {
        return Err(ApiError::NotFound("Agreement not found".to_string()));
    };

    Ok(Json(AgreementResponse::from_db(agreement)))
}

async fn create_agreement(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AgreementCreate>,
) -> Result<(axum::http::StatusCode, Json<AgreementResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let agreement = repositories::agreements::create(
        state.db(),
        repositories::agreements::CreateAgreement {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            discount_percent: payload.discount_percent,
            description: payload.description.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create agreement"))?;

    Ok((axum::http::StatusCode::CREATED, Json(AgreementResponse::from_db(agreement))))
}

async fn update_agreement(
    Path(agreement_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AgreementUpdate>,
) -> Result<Json<AgreementResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let agreement = repositories::agreements::find_by_id(state.db(), &agreement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch agreement"))?;

    let Some(agreement) = agreement else {
        return Err(ApiError::NotFound("Agreement not found".to_string()));
    };

    repositories::agreements::update(
        state.db(),
        &agreement.id,
        repositories::agreements::UpdateAgreement {
            name: payload.name,
            discount_percent: payload.discount_percent,
            description: payload.description,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update agreement"))?;

    let updated = repositories::agreements::find_by_id(state.db(), &agreement_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated agreement"))?
        .ok_or_else(|| ApiError::NotFound("Agreement not found".to_string()))?;

    Ok(Json(AgreementResponse::from_db(updated)))
}

async fn delete_agreement(
    Path(agreement_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let deactivated =
        repositories::agreements::deactivate(state.db(), &agreement_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to deactivate agreement"))?;

    if deactivated == 0 {
        return Err(ApiError::NotFound("Agreement not found".to_string()));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}
