use axum::extract::{Path, State};
use axum::{routing::get, routing::post, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{require_role, CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{EnrollmentStatus, GroupStatus, RoleName};
use crate::repositories;
use crate::schemas::enrollment::{EnrollmentCreate, EnrollmentResponse, RosterEntryResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_enrollment))
        .route("/:enrollment_id", get(get_enrollment))
        .route("/:enrollment_id/cancel", post(cancel_enrollment))
        .route("/group/:group_id", get(list_for_group))
        .route("/student/:student_id", get(list_for_student))
}

async fn create_enrollment(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<EnrollmentCreate>,
) -> Result<(axum::http::StatusCode, Json<EnrollmentResponse>), ApiError> {
    let student = repositories::students::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;
    let Some(student) = student else {
        return Err(ApiError::NotFound("Student not found".to_string()));
    };

    let group = repositories::groups::find_by_id(state.db(), &payload.group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?;
    let Some(group) = group else {
        return Err(ApiError::NotFound("Group not found".to_string()));
    };

    if group.status == GroupStatus::Completed {
        return Err(ApiError::BadRequest("Cannot enroll into a completed group".to_string()));
    }

    let existing = repositories::enrollments::exists_pair(state.db(), &student.id, &group.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing enrollment"))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest(
            "Student is already enrolled in this group".to_string(),
        ));
    }

    let active = repositories::groups::count_active_enrollments(state.db(), &group.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;
    if active >= group.capacity as i64 {
        return Err(ApiError::BadRequest("Group is at full capacity".to_string()));
    }

    let agreed_price = match payload.agreed_price {
        Some(price) if price >= 0.0 => price,
        Some(_) => return Err(ApiError::BadRequest("agreed_price must not be negative".to_string())),
        None => default_price(&state, &student.id, &group.level_id).await?,
    };

    let now = primitive_now_utc();
    let enrollment = repositories::enrollments::create(
        state.db(),
        repositories::enrollments::CreateEnrollment {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            group_id: &group.id,
            agreed_price,
            enrolled_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create enrollment"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        enrollment_id = %enrollment.id,
        group_id = %group.id,
        action = "enrollment_create",
        "Student enrolled"
    );

    Ok((axum::http::StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

/// Level base price minus the best partner-school discount, when one applies.
async fn default_price(
    state: &AppState,
    student_id: &str,
    level_id: &str,
) -> Result<f64, ApiError> {
    let level = repositories::levels::find_by_id(state.db(), level_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch level"))?
        .ok_or_else(|| ApiError::data_integrity("Group references a missing level"))?;

    let discount = repositories::schools::best_discount_for_student(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to resolve discount"))?
        .unwrap_or(0.0);

    Ok(level.base_price * (1.0 - discount / 100.0))
}

async fn get_enrollment(
    Path(enrollment_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = repositories::enrollments::find_by_id(state.db(), &enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?;

    let Some(enrollment) = enrollment else {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    };

    Ok(Json(EnrollmentResponse::from_db(enrollment)))
}

async fn cancel_enrollment(
    Path(enrollment_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    let enrollment = repositories::enrollments::find_by_id(state.db(), &enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?;

    let Some(enrollment) = enrollment else {
        return Err(ApiError::NotFound("Enrollment not found".to_string()));
    };

    match enrollment.status {
        EnrollmentStatus::Active => {}
        EnrollmentStatus::Completed => {
            return Err(ApiError::Conflict("Enrollment is already completed".to_string()))
        }
        EnrollmentStatus::Cancelled => {
            return Err(ApiError::Conflict("Enrollment is already cancelled".to_string()))
        }
    }

    repositories::enrollments::update_status(
        state.db(),
        &enrollment.id,
        EnrollmentStatus::Cancelled,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to cancel enrollment"))?;

    let updated = repositories::enrollments::find_by_id(state.db(), &enrollment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated enrollment"))?
        .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    Ok(Json(EnrollmentResponse::from_db(updated)))
}

/// The roster carries agreed prices, so it is staff-only.
async fn list_for_group(
    Path(group_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RosterEntryResponse>>, ApiError> {
    require_role(&auth, &[RoleName::Admin, RoleName::Teacher])?;

    let group = repositories::groups::find_by_id(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?;
    if group.is_none() {
        return Err(ApiError::NotFound("Group not found".to_string()));
    }

    let roster = repositories::enrollments::list_for_group(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(roster.into_iter().map(RosterEntryResponse::from_view).collect()))
}

async fn list_for_student(
    Path(student_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<EnrollmentResponse>>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;
    if student.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let enrollments = repositories::enrollments::list_for_student(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(enrollments.into_iter().map(EnrollmentResponse::from_db).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn duplicate_enrollment_is_rejected() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let admin = test_support::insert_admin(ctx.state.db(), "enradmin", "Enr", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/enrollments",
                Some(&token),
                Some(json!({
                    "student_id": fixture.student.id,
                    "group_id": fixture.group.id,
                })),
            ))
            .await
            .expect("re-enroll");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
        assert_eq!(body["message"], "Student is already enrolled in this group");
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let ctx = test_support::setup_test_context().await;
        // Fixture group capacity is 2 and already holds one enrollment.
        let fixture = test_support::academic_fixture(&ctx).await;

        test_support::insert_enrollment(&ctx, &fixture.group.id, "second", "second@example.com")
            .await;

        let third = test_support::insert_student(&ctx, "third", "third@example.com").await;

        let admin = test_support::insert_admin(ctx.state.db(), "capadmin", "Cap", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/enrollments",
                Some(&token),
                Some(json!({
                    "student_id": third.id,
                    "group_id": fixture.group.id,
                })),
            ))
            .await
            .expect("enroll past capacity");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "response: {body}");
        assert_eq!(body["message"], "Group is at full capacity");
    }
}
