use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::stats::CourseRevenueResponse;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/financial/revenue-by-course", get(revenue_by_course))
}

async fn revenue_by_course(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseRevenueResponse>>, ApiError> {
    let rows = repositories::stats::revenue_by_course(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to aggregate revenue"))?;

    Ok(Json(rows.into_iter().map(CourseRevenueResponse::from_row).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use tower::ServiceExt;

    use crate::core::time::primitive_now_utc;
    use crate::db::types::EnrollmentStatus;
    use crate::repositories;
    use crate::test_support;

    #[tokio::test]
    async fn cancelled_enrollments_do_not_count_towards_revenue() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        // Fixture enrollment carries 200.0; add a cancelled one at 999.0.
        let cancelled = test_support::insert_enrollment_with_price(
            &ctx,
            &fixture.group.id,
            "richdropout",
            "dropout@example.com",
            999.0,
        )
        .await;
        repositories::enrollments::update_status(
            ctx.state.db(),
            &cancelled.id,
            EnrollmentStatus::Cancelled,
            primitive_now_utc(),
        )
        .await
        .expect("cancel");

        let admin = test_support::insert_admin(ctx.state.db(), "statsadmin", "Sta", "Admin").await;
        let token = test_support::bearer_token_for(&admin, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/stats/financial/revenue-by-course",
                Some(&token),
                None,
            ))
            .await
            .expect("revenue");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");

        let course =
            body.as_array().unwrap().iter().find(|row| row["course_id"] == fixture.course.id.as_str());
        let course = course.expect("fixture course present");
        assert_eq!(course["total_revenue"], 200.0);
        assert_eq!(course["student_count"], 1);
    }

    #[tokio::test]
    async fn revenue_endpoint_is_admin_only() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                "/api/v1/stats/financial/revenue-by-course",
                Some(&token),
                None,
            ))
            .await
            .expect("revenue");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
