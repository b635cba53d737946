use axum::extract::{Path, Query, State};
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_group_teacher, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::grade::{
    GradeBatchRequest, GradeBatchResponse, GroupGradeResponse, StudentGradeResponse,
};
use crate::services::academic;

#[derive(Debug, Deserialize)]
pub(crate) struct GroupGradesQuery {
    #[serde(default)]
    period: Option<i32>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/batch", post(save_batch))
        .route("/group/:group_id", get(list_for_group))
        .route("/student/:student_id", get(list_for_student))
}

async fn save_batch(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<GradeBatchRequest>,
) -> Result<Json<GradeBatchResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let open = academic::grades_open(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to read settings"))?;
    if !open {
        return Err(ApiError::Conflict("Grade entry is currently closed".to_string()));
    }

    let group = repositories::groups::find_with_teacher(state.db(), &payload.group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    require_group_teacher(&auth, &group)?;

    if payload.grades.is_empty() {
        return Err(ApiError::BadRequest("grades must not be empty".to_string()));
    }

    let enrollment_ids: Vec<String> =
        payload.grades.iter().map(|grade| grade.enrollment_id.clone()).collect();
    let unknown =
        repositories::enrollments::ids_outside_group(state.db(), &group.id, &enrollment_ids)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to validate enrollments"))?;
    if !unknown.is_empty() {
        return Err(ApiError::BadRequest(format!(
            "Enrollment(s) not part of this group: {}",
            unknown.join(", ")
        )));
    }

    let grades: Vec<repositories::grades::UpsertGrade<'_>> = payload
        .grades
        .iter()
        .map(|grade| repositories::grades::UpsertGrade {
            enrollment_id: &grade.enrollment_id,
            score: grade.score,
            comments: grade.comments.as_deref(),
        })
        .collect();

    repositories::grades::save_batch(
        state.db(),
        payload.period,
        &auth.user.id,
        &grades,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save grades"))?;

    tracing::info!(
        user_id = %auth.user.id,
        group_id = %group.id,
        period = payload.period,
        records = grades.len(),
        action = "grades_save",
        "Grade batch saved"
    );

    Ok(Json(GradeBatchResponse { saved: grades.len() }))
}

async fn list_for_group(
    Path(group_id): Path<String>,
    Query(params): Query<GroupGradesQuery>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<GroupGradeResponse>>, ApiError> {
    if let Some(period) = params.period {
        if !(1..=2).contains(&period) {
            return Err(ApiError::BadRequest("period must be 1 or 2".to_string()));
        }
    }

    let group = repositories::groups::find_with_teacher(state.db(), &group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    require_group_teacher(&auth, &group)?;

    let rows = repositories::grades::list_for_group(state.db(), &group.id, params.period)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(rows.into_iter().map(GroupGradeResponse::from_row).collect()))
}

async fn list_for_student(
    Path(student_id): Path<String>,
    CurrentUser(_auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<StudentGradeResponse>>, ApiError> {
    let student = repositories::students::find_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch student"))?;
    if student.is_none() {
        return Err(ApiError::NotFound("Student not found".to_string()));
    }

    let rows = repositories::grades::list_for_student(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(rows.into_iter().map(StudentGradeResponse::from_row).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn grade_batch_upserts_per_period() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let save = |score: f64| {
            test_support::json_request(
                Method::POST,
                "/api/v1/grades/batch",
                Some(&token),
                Some(json!({
                    "group_id": fixture.group.id,
                    "period": 1,
                    "grades": [
                        {"enrollment_id": fixture.enrollment.id, "score": score},
                    ],
                })),
            )
        };

        let response = ctx.app.clone().oneshot(save(72.5)).await.expect("first save");
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx.app.clone().oneshot(save(85.0)).await.expect("second save");
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/grades/group/{}?period=1", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("list grades");

        let body = test_support::read_json(response).await;
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["score"], 85.0);
    }

    #[tokio::test]
    async fn grade_entry_respects_grades_open_setting() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let admin = test_support::insert_admin(ctx.state.db(), "gradeadmin", "Gra", "Admin").await;
        let admin_token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::PUT,
                "/api/v1/settings/GRADES_OPEN",
                Some(&admin_token),
                Some(json!({"value": "false"})),
            ))
            .await
            .expect("close grades");
        assert_eq!(response.status(), StatusCode::OK);

        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades/batch",
                Some(&token),
                Some(json!({
                    "group_id": fixture.group.id,
                    "period": 1,
                    "grades": [
                        {"enrollment_id": fixture.enrollment.id, "score": 50.0},
                    ],
                })),
            ))
            .await
            .expect("save while closed");

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn out_of_range_score_is_rejected() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/grades/batch",
                Some(&token),
                Some(json!({
                    "group_id": fixture.group.id,
                    "period": 1,
                    "grades": [
                        {"enrollment_id": fixture.enrollment.id, "score": 140.0},
                    ],
                })),
            ))
            .await
            .expect("save bad score");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
