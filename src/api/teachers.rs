use axum::extract::{Multipart, Path, State};
use axum::{routing::get, routing::post, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::RoleName;
use crate::repositories;
use crate::schemas::people::{TeacherCreate, TeacherResponse, TeacherUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers).post(create_teacher))
        .route("/:teacher_id", get(get_teacher).patch(update_teacher))
        .route("/:teacher_id/photo", post(upload_photo))
}

async fn list_teachers(
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<TeacherResponse>>, ApiError> {
    let teachers = repositories::teachers::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list teachers"))?;

    let mut responses = Vec::with_capacity(teachers.len());
    for teacher in teachers {
        let user = repositories::users::fetch_one_by_id(state.db(), &teacher.user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load teacher user"))?;
        responses.push(TeacherResponse::from_db(teacher, &user));
    }

    Ok(Json(responses))
}

async fn get_teacher(
    Path(teacher_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<TeacherResponse>, ApiError> {
    let teacher = repositories::teachers::find_by_id(state.db(), &teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?;

    let Some(teacher) = teacher else {
        return Err(ApiError::NotFound("Teacher not found".to_string()));
    };

    let user = repositories::users::fetch_one_by_id(state.db(), &teacher.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load teacher user"))?;

    Ok(Json(TeacherResponse::from_db(teacher, &user)))
}

async fn create_teacher(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TeacherCreate>,
) -> Result<(axum::http::StatusCode, Json<TeacherResponse>), ApiError> {
    let user = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let existing = repositories::teachers::find_by_user_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing teacher"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "A teacher profile already exists for this user".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let teacher = repositories::teachers::create(
        state.db(),
        repositories::teachers::CreateTeacher {
            id: &Uuid::new_v4().to_string(),
            user_id: &payload.user_id,
            specialty: payload.specialty.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create teacher"))?;

    repositories::roles::assign(state.db(), &payload.user_id, RoleName::Teacher)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign teacher role"))?;

    Ok((axum::http::StatusCode::CREATED, Json(TeacherResponse::from_db(teacher, &user))))
}

async fn update_teacher(
    Path(teacher_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<TeacherUpdate>,
) -> Result<Json<TeacherResponse>, ApiError> {
    let teacher = repositories::teachers::find_by_id(state.db(), &teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?;

    let Some(teacher) = teacher else {
        return Err(ApiError::NotFound("Teacher not found".to_string()));
    };

    repositories::teachers::update_specialty(
        state.db(),
        &teacher.id,
        payload.specialty.as_deref(),
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update teacher"))?;

    let teacher = repositories::teachers::find_by_id(state.db(), &teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;
    let user = repositories::users::fetch_one_by_id(state.db(), &teacher.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load teacher user"))?;

    Ok(Json(TeacherResponse::from_db(teacher, &user)))
}

async fn upload_photo(
    Path(teacher_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<TeacherResponse>, ApiError> {
    let teacher = repositories::teachers::find_by_id(state.db(), &teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?;

    let Some(teacher) = teacher else {
        return Err(ApiError::NotFound("Teacher not found".to_string()));
    };

    let key = super::uploads::store_photo(&state, "teachers", &teacher.id, multipart).await?;

    repositories::teachers::set_photo_key(state.db(), &teacher.id, &key, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store photo key"))?;

    let teacher = repositories::teachers::find_by_id(state.db(), &teacher_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated teacher"))?
        .ok_or_else(|| ApiError::NotFound("Teacher not found".to_string()))?;
    let user = repositories::users::fetch_one_by_id(state.db(), &teacher.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load teacher user"))?;

    Ok(Json(TeacherResponse::from_db(teacher, &user)))
}
