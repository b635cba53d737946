use axum::extract::{Path, Query, State};
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{parse_date, primitive_now_utc};
use crate::db::types::GroupStatus;
use crate::repositories;
use crate::schemas::group::{
    CloseGroupResponse, GroupCreate, GroupDetailResponse, GroupResponse, GroupUpdate,
};
use crate::services::lifecycle::{self, LifecycleError};

#[derive(Debug, Deserialize)]
pub(crate) struct GroupListQuery {
    #[serde(default)]
    #[serde(alias = "levelId")]
    level_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "teacherId")]
    teacher_id: Option<String>,
    #[serde(default)]
    status: Option<GroupStatus>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/:group_id", get(get_group).patch(update_group))
        .route("/:group_id/submit-grades", post(submit_grades))
        .route("/:group_id/close", post(close_group))
}

async fn list_groups(
    Query(params): Query<GroupListQuery>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupResponse>>, ApiError> {
    let groups = repositories::groups::list(
        state.db(),
        repositories::groups::GroupListFilter {
            level_id: params.level_id,
            teacher_id: params.teacher_id,
            status: params.status,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list groups"))?;

    Ok(Json(groups.into_iter().map(GroupResponse::from_db).collect()))
}

async fn get_group(
    Path(group_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GroupDetailResponse>, ApiError> {
    let view = repositories::groups::find_with_teacher(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?;

    let Some(view) = view else {
        return Err(ApiError::NotFound("Group not found".to_string()));
    };

    let active_enrollments = repositories::groups::count_active_enrollments(state.db(), &view.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count enrollments"))?;

    Ok(Json(GroupDetailResponse::from_view(view, active_enrollments)))
}

async fn create_group(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GroupCreate>,
) -> Result<(axum::http::StatusCode, Json<GroupResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let level = repositories::levels::find_by_id(state.db(), &payload.level_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch level"))?;
    if level.is_none() {
        return Err(ApiError::NotFound("Level not found".to_string()));
    }

    if let Some(teacher_id) = payload.teacher_id.as_deref() {
        let teacher = repositories::teachers::find_by_id(state.db(), teacher_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?;
        if teacher.is_none() {
            return Err(ApiError::NotFound("Teacher not found".to_string()));
        }
    }

    if let Some(classroom_id) = payload.classroom_id.as_deref() {
        let classroom = repositories::classrooms::find_by_id(state.db(), classroom_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch classroom"))?;
        if classroom.is_none() {
            return Err(ApiError::NotFound("Classroom not found".to_string()));
        }
    }

    let start_date = parse_date(&payload.start_date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid start_date '{}'", payload.start_date)))?;
    let end_date = parse_date(&payload.end_date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid end_date '{}'", payload.end_date)))?;

    if end_date <= start_date {
        return Err(ApiError::BadRequest("end_date must be after start_date".to_string()));
    }

    let now = primitive_now_utc();
    let group = repositories::groups::create(
        state.db(),
        repositories::groups::CreateGroup {
            id: &Uuid::new_v4().to_string(),
            level_id: &payload.level_id,
            teacher_id: payload.teacher_id.as_deref(),
            classroom_id: payload.classroom_id.as_deref(),
            code: payload.code.trim(),
            capacity: payload.capacity,
            start_date,
            end_date,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create group"))?;

    tracing::info!(
        admin_id = %admin.user.id,
        group_id = %group.id,
        action = "group_create",
        "Group created"
    );

    Ok((axum::http::StatusCode::CREATED, Json(GroupResponse::from_db(group))))
}

async fn update_group(
    Path(group_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<GroupUpdate>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group = repositories::groups::find_by_id(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?;

    let Some(group) = group else {
        return Err(ApiError::NotFound("Group not found".to_string()));
    };

    if let Some(teacher_id) = payload.teacher_id.as_deref() {
        let teacher = repositories::teachers::find_by_id(state.db(), teacher_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch teacher"))?;
        if teacher.is_none() {
            return Err(ApiError::NotFound("Teacher not found".to_string()));
        }
    }

    let start_date = match payload.start_date.as_deref() {
        Some(raw) => Some(
            parse_date(raw)
                .ok_or_else(|| ApiError::BadRequest(format!("Invalid start_date '{raw}'")))?,
        ),
        None => None,
    };
    let end_date = match payload.end_date.as_deref() {
        Some(raw) => Some(
            parse_date(raw).ok_or_else(|| ApiError::BadRequest(format!("Invalid end_date '{raw}'")))?,
        ),
        None => None,
    };

    let effective_start = start_date.unwrap_or(group.start_date);
    let effective_end = end_date.unwrap_or(group.end_date);
    if effective_end <= effective_start {
        return Err(ApiError::BadRequest("end_date must be after start_date".to_string()));
    }

    repositories::groups::update(
        state.db(),
        &group.id,
        repositories::groups::UpdateGroup {
            teacher_id: payload.teacher_id,
            classroom_id: payload.classroom_id,
            code: payload.code,
            capacity: payload.capacity,
            start_date,
            end_date,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update group"))?;

    let updated = repositories::groups::fetch_one_by_id(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch updated group"))?;

    Ok(Json(GroupResponse::from_db(updated)))
}

/// Teacher-only: the caller must be the group's assigned teacher.
async fn submit_grades(
    Path(group_id): Path<String>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GroupResponse>, ApiError> {
    let group =
        lifecycle::submit_grades(state.db(), &group_id, &auth.user.id).await.map_err(|err| {
            match err {
                LifecycleError::GroupNotFound => ApiError::NotFound("Group not found".to_string()),
                LifecycleError::MissingTeacher => {
                    ApiError::data_integrity("Group has no assigned teacher")
                }
                LifecycleError::NotAssignedTeacher => {
                    ApiError::Forbidden("Only the assigned teacher may submit grades")
                }
                LifecycleError::GradesAlreadySubmitted => {
                    ApiError::Conflict("Grades were already submitted for this group".to_string())
                }
                LifecycleError::AlreadyCompleted => {
                    ApiError::Conflict("Group is already completed".to_string())
                }
                LifecycleError::Db(e) => ApiError::internal(e, "Failed to submit grades"),
            }
        })?;

    tracing::info!(
        user_id = %auth.user.id,
        group_id = %group.id,
        action = "grades_submit",
        "Grades submitted"
    );

    Ok(Json(GroupResponse::from_db(group)))
}

async fn close_group(
    Path(group_id): Path<String>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<CloseGroupResponse>, ApiError> {
    let (group, enrollments_completed) =
        lifecycle::close_group(state.db(), &group_id).await.map_err(|err| match err {
            LifecycleError::GroupNotFound => ApiError::NotFound("Group not found".to_string()),
            LifecycleError::AlreadyCompleted => {
                ApiError::Conflict("Group is already completed".to_string())
            }
            LifecycleError::Db(e) => ApiError::internal(e, "Failed to close group"),
            other => ApiError::internal(other, "Failed to close group"),
        })?;

    tracing::info!(
        admin_id = %admin.user.id,
        group_id = %group.id,
        action = "group_close",
        "Group closed by admin"
    );

    Ok(Json(CloseGroupResponse {
        group: GroupResponse::from_db(group),
        enrollments_completed,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::db::types::{EnrollmentStatus, GroupStatus, RoleName};
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn submit_grades_moves_status_forward_once() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/submit-grades", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("submit grades");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["status"], "GRADES_SUBMITTED");

        // Second submission: state machine refuses to move again.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/submit-grades", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("submit grades again");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn submit_grades_notifies_admins() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let admin =
            test_support::insert_admin(ctx.state.db(), "notifyadmin", "Noti", "Admin").await;

        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/submit-grades", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("submit grades");
        assert_eq!(response.status(), StatusCode::OK);

        let count = repositories::notifications::unread_count(ctx.state.db(), &admin.id)
            .await
            .expect("unread count");
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn only_the_assigned_teacher_may_submit() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let other = test_support::insert_user_with_roles(
            ctx.state.db(),
            "otherteacher",
            "other@example.com",
            "Other",
            "Teacher",
            "other-pass-1",
            &[RoleName::Teacher],
        )
        .await;
        test_support::insert_teacher_profile(ctx.state.db(), &other.id).await;

        let token = test_support::bearer_token_for(&other, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/submit-grades", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("submit grades");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let group = repositories::groups::fetch_one_by_id(ctx.state.db(), &fixture.group.id)
            .await
            .expect("group");
        assert_eq!(group.status, GroupStatus::Active);
    }

    #[tokio::test]
    async fn close_group_completes_active_enrollments_only() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        // Two enrollments: one stays active, one is cancelled up front.
        let e1 = fixture.enrollment.clone();
        let e2 = test_support::insert_enrollment(
            &ctx,
            &fixture.group.id,
            "cancelledstudent",
            "cancelled@example.com",
        )
        .await;
        repositories::enrollments::update_status(
            ctx.state.db(),
            &e2.id,
            EnrollmentStatus::Cancelled,
            crate::core::time::primitive_now_utc(),
        )
        .await
        .expect("cancel enrollment");

        let admin = test_support::insert_admin(ctx.state.db(), "closeadmin", "Close", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/close", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("close group");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["group"]["status"], "COMPLETED");
        assert_eq!(body["enrollments_completed"], 1);

        let e1_after = repositories::enrollments::find_by_id(ctx.state.db(), &e1.id)
            .await
            .expect("e1")
            .expect("e1 exists");
        assert_eq!(e1_after.status, EnrollmentStatus::Completed);

        let e2_after = repositories::enrollments::find_by_id(ctx.state.db(), &e2.id)
            .await
            .expect("e2")
            .expect("e2 exists");
        assert_eq!(e2_after.status, EnrollmentStatus::Cancelled);

        // Closing twice is a conflict.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/close", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("close group again");
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn close_group_requires_admin() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                &format!("/api/v1/groups/{}/close", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("close group");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
