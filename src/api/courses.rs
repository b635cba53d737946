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
use crate::schemas::catalog::{
    CourseCreate, CourseResponse, CourseUpdate, LevelCreate, LevelResponse, LevelUpdate,
};

#[derive(Debug, Deserialize)]
pub(crate) struct CourseListQuery {
    #[serde(default)]
    #[serde(alias = "includeInactive")]
    include_inactive: bool,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:course_id", get(get_course).patch(update_course))
        .route("/:course_id/levels", get(list_levels).post(create_level))
        .route(
            "/:course_id/levels/:level_id",
            axum::routing::patch(update_level).delete(delete_level),
        )
}

async fn list_courses(
    Query(params): Query<CourseListQuery>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseResponse>>, ApiError> {
    let courses = repositories::courses::list(state.db(), params.include_inactive)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list courses"))?;

    Ok(Json(courses.into_iter().map(CourseResponse::from_db).collect()))
}

async fn get_course(
    Path(course_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;
    Ok(Json(CourseResponse::from_db(course)))
}

async fn create_course(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseCreate>,
) -> Result<(axum::http::StatusCode, Json<CourseResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let course = repositories::courses::create(
        state.db(),
        repositories::courses::CreateCourse {
            id: &Uuid::new_v4().to_string(),
            name: payload.name.trim(),
            description: payload.description.as_deref(),
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create course"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        course_id = %course.id,
        action = "course_create",
        "Course created"
    );

    Ok((axum::http::StatusCode::CREATED, Json(CourseResponse::from_db(course))))
}

async fn update_course(
    Path(course_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<CourseUpdate>,
) -> Result<Json<CourseResponse>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;

    repositories::courses::update(
        state.db(),
        &course.id,
        repositories::courses::UpdateCourse {
            name: payload.name,
            description: payload.description,
            is_active: payload.is_active,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update course"))?;

    let updated = fetch_course(&state, &course_id).await?;
    Ok(Json(CourseResponse::from_db(updated)))
}

async fn list_levels(
    Path(course_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<LevelResponse>>, ApiError> {
    let course = fetch_course(&state, &course_id).await?;

    let levels = repositories::levels::list_for_course(state.db(), &course.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list levels"))?;

    Ok(Json(levels.into_iter().map(LevelResponse::from_db).collect()))
}

async fn create_level(
    Path(course_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<LevelCreate>,
) -> Result<(axum::http::StatusCode, Json<LevelResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let course = fetch_course(&state, &course_id).await?;

    let existing = repositories::levels::exists_order(state.db(), &course.id, payload.level_order)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check level order"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(format!(
            "Level {} already exists for this course",
            payload.level_order
        )));
    }

    let now = primitive_now_utc();
    let level = repositories::levels::create(
        state.db(),
        repositories::levels::CreateLevel {
            id: &Uuid::new_v4().to_string(),
            course_id: &course.id,
            name: payload.name.trim(),
            level_order: payload.level_order,
            base_price: payload.base_price,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create level"))?;

    Ok((axum::http::StatusCode::CREATED, Json(LevelResponse::from_db(level))))
}

async fn update_level(
    Path((course_id, level_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<LevelUpdate>,
) -> Result<Json<LevelResponse>, ApiError> {
    let level = fetch_level(&state, &course_id, &level_id).await?;

    repositories::levels::update(
        state.db(),
        &level.id,
        repositories::levels::UpdateLevel {
            name: payload.name,
            base_price: payload.base_price,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update level"))?;

    let updated = fetch_level(&state, &course_id, &level_id).await?;
    Ok(Json(LevelResponse::from_db(updated)))
}

async fn delete_level(
    Path((course_id, level_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<axum::http::StatusCode, ApiError> {
    let level = fetch_level(&state, &course_id, &level_id).await?;

    let group_count = repositories::levels::count_groups(state.db(), &level.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count groups"))?;

    if group_count > 0 {
        return Err(ApiError::BadRequest(format!(
            "Cannot delete a level with {group_count} existing group(s)"
        )));
    }

    repositories::levels::delete_by_id(state.db(), &level.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete level"))?;

    Ok(axum::http::StatusCode::NO_CONTENT)
}

async fn fetch_course(
    state: &AppState,
    course_id: &str,
) -> Result<crate::db::models::Course, ApiError> {
    repositories::courses::find_by_id(state.db(), course_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch course"))?
        .ok_or_else(|| ApiError::NotFound("Course not found".to_string()))
}

async fn fetch_level(
    state: &AppState,
    course_id: &str,
    level_id: &str,
) -> Result<crate::db::models::Level, ApiError> {
    let level = repositories::levels::find_by_id(state.db(), level_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch level"))?;

    match level {
        Some(level) if level.course_id == course_id => Ok(level),
        _ => Err(ApiError::NotFound("Level not found".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn levels_are_unique_per_order_and_listed_in_order() {
        let ctx = test_support::setup_test_context().await;

        let admin = test_support::insert_admin(ctx.state.db(), "courseadmin", "Cur", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/courses",
                Some(&token),
                Some(json!({"name": "Welding"})),
            ))
            .await
            .expect("create course");
        let created = test_support::read_json(response).await;
        let course_id = created["id"].as_str().expect("course id").to_string();

        for (name, order) in [("Advanced", 2), ("Basics", 1)] {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    &format!("/api/v1/courses/{course_id}/levels"),
                    Some(&token),
                    Some(json!({"name": name, "level_order": order, "base_price": 250.0})),
                ))
                .await
                .expect("create level");
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/courses/{course_id}/levels"),
                Some(&token),
                Some(json!({"name": "Basics again", "level_order": 1})),
            ))
            .await
            .expect("create duplicate level");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/courses/{course_id}/levels"),
                Some(&token),
                None,
            ))
            .await
            .expect("list levels");

        let body = test_support::read_json(response).await;
        let names: Vec<&str> =
            body.as_array().unwrap().iter().map(|l| l["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["Basics", "Advanced"]);
    }
}
