use axum::extract::{Multipart, Path, State};
use axum::{routing::get, routing::post, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{parse_date, primitive_now_utc};
use crate::db::types::RoleName;
use crate::repositories;
use crate::schemas::people::{GuardianResponse, StudentCreate, StudentResponse, StudentUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/:student_id", get(get_student).patch(update_student))
        .route("/:student_id/photo", post(upload_photo))
        .route("/:student_id/guardians", get(list_guardians))
        .route("/:student_id/guardians/:guardian_id", post(link_guardian).delete(unlink_guardian))
}

async fn list_students(
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    let students = repositories::students::list(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    let mut responses = Vec::with_capacity(students.len());
    for student in students {
        let user = repositories::users::fetch_one_by_id(state.db(), &student.user_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load student user"))?;
        responses.push(StudentResponse::from_db(student, &user));
    }

    Ok(Json(responses))
}

async fn get_student(
    Path(student_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = fetch_student(&state, &student_id).await?;
    let user = repositories::users::fetch_one_by_id(state.db(), &student.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student user"))?;

    Ok(Json(StudentResponse::from_db(student, &user)))
}

async fn create_student(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<StudentCreate>,
) -> Result<(axum::http::StatusCode, Json<StudentResponse>), ApiError> {
    let user = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    let existing = repositories::students::find_by_user_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing student"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "A student profile already exists for this user".to_string(),
        ));
    }

    let birth_date = match payload.birth_date.as_deref() {
        Some(raw) => Some(
            parse_date(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid birth_date '{raw}'")))?,
        ),
        None => None,
    };

    if let Some(school_id) = payload.school_id.as_deref() {
        let school = repositories::schools::find_by_id(state.db(), school_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch school"))?;
        if school.is_none() {
            return Err(ApiError::NotFound("School not found".to_string()));
        }
    }

    let now = primitive_now_utc();
    let student = repositories::students::create(
        state.db(),
        repositories::students::CreateStudent {
            id: &Uuid::new_v4().to_string(),
            user_id: &payload.user_id,
            birth_date,
            school_id: payload.school_id.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create student"))?;

    repositories::roles::assign(state.db(), &payload.user_id, RoleName::Student)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to assign student role"))?;

    Ok((axum::http::StatusCode::CREATED, Json(StudentResponse::from_db(student, &user))))
}

async fn update_student(
    Path(student_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = fetch_student(&state, &student_id).await?;

    let birth_date = match payload.birth_date.as_deref() {
        Some(raw) => Some(
            parse_date(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid birth_date '{raw}'")))?,
        ),
        None => None,
    };

    repositories::students::update(
        state.db(),
        &student.id,
        repositories::students::UpdateStudent {
            birth_date,
            school_id: payload.school_id.as_deref(),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update student"))?;

    let student = fetch_student(&state, &student_id).await?;
    let user = repositories::users::fetch_one_by_id(state.db(), &student.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student user"))?;

    Ok(Json(StudentResponse::from_db(student, &user)))
}

async fn upload_photo(
    Path(student_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = fetch_student(&state, &student_id).await?;

    let key = super::uploads::store_photo(&state, "students", &student.id, multipart).await?;

    repositories::students::set_photo_key(state.db(), &student.id, &key, primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store photo key"))?;

    let student = fetch_student(&state, &student_id).await?;
    let user = repositories::users::fetch_one_by_id(state.db(), &student.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student user"))?;

    Ok(Json(StudentResponse::from_db(student, &user)))
}

async fn list_guardians(
    Path(student_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GuardianResponse>>, ApiError> {
    let student = fetch_student(&state, &student_id).await?;

    let guardians = repositories::students::list_guardians(state.db(), &student.id)
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

async fn link_guardian(
    Path((student_id, guardian_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let student = fetch_student(&state, &student_id).await?;

    let guardian = repositories::guardians::find_by_id(state.db(), &guardian_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch guardian"))?;
    let Some(guardian) = guardian else {
        return Err(ApiError::NotFound("Guardian not found".to_string()));
    };

    repositories::students::link_guardian(state.db(), &student.id, &guardian.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to link guardian"))?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn unlink_guardian(
    Path((student_id, guardian_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let student = fetch_student(&state, &student_id).await?;

    let removed = repositories::students::unlink_guardian(state.db(), &student.id, &guardian_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to unlink guardian"))?;

    if removed == 0 {
        return Err(ApiError::NotFound("Guardian link not found".to_string()));
    }

    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn fetch_student(
    state: &AppState,
    student_id: &str,
) -> Result<crate::db::models::Student, ApiError> {
    repositories::students::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))
}
