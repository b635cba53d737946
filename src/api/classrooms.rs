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
use crate::schemas::catalog::{ClassroomCreate, ClassroomResponse, ClassroomUpdate};

#[derive(Debug, Deserialize)]
pub(crate) struct ClassroomListQuery {
    #[serde(default)]
    #[serde(alias = "includeInactive")]
    include_inactive: bool,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classrooms).post(create_classroom))
        .route("/:classroom_id", get(get_classroom).patch(update_classroom).delete(delete_classroom))
}

async fn list_classrooms(
    Query(params): Query<ClassroomListQuery>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ClassroomResponse>>, ApiError> {
    let classrooms = repositories::classrooms::list(state.db(), params.include_inactive)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classrooms"))?;

    Ok(Json(classrooms.into_iter().map(ClassroomResponse::from_db).collect()))
}

async fn get_classroom(
    Path(classroom_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let classroom = repositories::classrooms::find_by_id(state.db(), &classroom_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch classroom"))?;

    let Some(classroom) = classroom else {
        return Err(ApiError::NotFound("Classroom not found".to_string()));
    };

    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn create_classroom(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ClassroomCreate>,
) -> Result<(axum::http::StatusCode, Json<ClassroomResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let classroom = repositories::classrooms::create(
        state.db(),
        repositories::classrooms::CreateClassroom {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            capacity: payload.capacity,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create classroom"))?;

    Ok((axum::http::StatusCode::CREATED, Json(ClassroomResponse::from_db(classroom))))
}

async fn update_classroom(
    Path(classroom_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<ClassroomUpdate>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let classroom = repositories::classrooms::find_by_id(state.db(), &classroom_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch classroom"))?;

    let Some(classroom) = classroom else {
        return Err(ApiError::NotFound("Classroom not found".to_string()));
    };

    repositories::classrooms::update(
        state.db(),
        &classroom.id,
        repositories::classrooms::UpdateClassroom {
            name: payload.name,
            capacity: payload.capacity,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update classroom"))?;

    let updated = repositories::classrooms::find_by_id(state.db(), &classroom_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated classroom"))?
        .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;

    Ok(Json(ClassroomResponse::from_db(updated)))
}

async fn delete_classroom(
    Path(classroom_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let deactivated =
        repositories::classrooms::deactivate(state.db(), &classroom_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to deactivate classroom"))?;

    if deactivated == 0 {
        return Err(ApiError::NotFound("Classroom not found".to_string()));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}
