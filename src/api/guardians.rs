use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::RoleName;
use crate::repositories;
use crate::schemas::people::{GuardianCreate, GuardianResponse, GuardianUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_guardians).post(create_guardian))
        .route("/:guardian_id", get(get_guardian).patch(update_guardian))
}

async fn list_guardians(
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GuardianResponse>>, ApiError> {
    let guardians = repositories::guardians::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list guardians"))?;

    let mut responses = Vec::with_capacity(guardians.len());
    for guardian in guardians {
        let user = repositories::users::fetch_one_by_id(state.db(), &guardian.user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load guardian user"))?;
        responses.push(GuardianResponse::from_db(guardian, &user));
    }

    Ok(Json(responses))
}

async fn get_guardian(
    Path(guardian_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GuardianResponse>, ApiError> {
    let guardian = repositories::guardians::find_by_id(state.db(), &guardian_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch guardian"))?;

    let Some(guardian) = guardian else {
        return Err(ApiError::NotFound("Guardian not found".to_string()));
    };

    let user = repositories::users::fetch_one_by_id(state.db(), &guardian.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load guardian user"))?;

    Ok(Json(GuardianResponse::from_db(guardian, &user)))
}

async fn create_guardian(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GuardianCreate>,
) -> Result<(axum::http::StatusCode, Json<GuardianResponse>), ApiError> {
    let user = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let existing = repositories::guardians::find_by_user_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing guardian"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "A guardian profile already exists for this user".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let guardian = repositories::guardians::create(
        state.db(),
        repositories::guardians::CreateGuardian {
            id: &Uuid::new_v4().to_string(),
            user_id: &payload.user_id,
            phone: payload.phone.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create guardian"))?;

    repositories::roles::assign(state.db(), &payload.user_id, RoleName::LegalGuardian)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign guardian role"))?;

    Ok((axum::http::StatusCode::CREATED, Json(GuardianResponse::from_db(guardian, &user))))
}

async fn update_guardian(
    Path(guardian_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GuardianUpdate>,
) -> Result<Json<GuardianResponse>, ApiError> {
    let guardian = repositories::guardians::find_by_id(state.db(), &guardian_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch guardian"))?;

    let Some(guardian) = guardian else {
        return Err(ApiError::NotFound("Guardian not found".to_string()));
    };

    repositories::guardians::update_phone(
        state.db(),
        &guardian.id,
        payload.phone.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update guardian"))?;

    let guardian = repositories::guardians::find_by_id(state.db(), &guardian_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated guardian"))?
        .ok_or_else(|| ApiError::NotFound("Guardian not found".to_string()))?;
    let user = repositories::users::fetch_one_by_id(state.db(), &guardian.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load guardian user"))?;

    Ok(Json(GuardianResponse::from_db(guardian, &user)))
}
