use axum::extract::{Path, Query, State};
use axum::{routing::get, routing::post, Json, Router};
use serde::Deserialize;
use time::Time;

use crate::api::errors::ApiError;
use crate::api::guards::{require_group_teacher, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_date, parse_date, parse_time_of_day, primitive_now_utc};
use crate::repositories;
use crate::repositories::groups::GroupWithTeacher;
use crate::schemas::attendance::{
    AttendanceBatchRequest, AttendanceStatsResponse, DayRosterEntry, DayRosterResponse,
    SaveBatchResponse, StatsQuery, StudentAttendanceStats,
};

#[derive(Debug, Deserialize)]
pub(crate) struct DayQuery {
    date: String,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/batch", post(save_batch))
        .route("/:group_id/date", get(day_roster))
        .route("/:group_id/stats", get(stats))
}

async fn fetch_group(state: &AppState, group_id: &str) -> Result<GroupWithTeacher, ApiError> {
    repositories::groups::find_with_teacher(state.db(), group_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch group"))?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))
}

async fn day_roster(
    Path(group_id): Path<String>,
    Query(params): Query<DayQuery>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<DayRosterResponse>, ApiError> {
    let date = parse_date(&params.date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid date '{}'", params.date)))?;

    let group = fetch_group(&state, &group_id).await?;
    require_group_teacher(&auth, &group)?;

    let rows = repositories::attendance::day_roster(state.db(), &group.id, date)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load attendance roster"))?;

    Ok(Json(DayRosterResponse {
        group_id: group.id,
        date: format_date(date),
        records: rows.into_iter().map(DayRosterEntry::from_row).collect(),
    }))
}

async fn save_batch(
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AttendanceBatchRequest>,
) -> Result<Json<SaveBatchResponse>, ApiError> {
    let date = parse_date(&payload.date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid date '{}'", payload.date)))?;

    let group = fetch_group(&state, &payload.group_id).await?;
    require_group_teacher(&auth, &group)?;

    if payload.records.is_empty() {
        return Err(ApiError::BadRequest("records must not be empty".to_string()));
    }

    // Validate the whole batch before touching the database: a single bad
    // record fails the request and nothing persists.
    let mut arrival_times: Vec<Option<Time>> = Vec::with_capacity(payload.records.len());
    for record in &payload.records {
        let arrival = match record.arrival_time.as_deref() {
            Some(raw) => Some(parse_time_of_day(raw).ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid arrival_time '{raw}'"))
            })?),
            None => None,
        };
        arrival_times.push(arrival);
    }

    let enrollment_ids: Vec<String> =
        payload.records.iter().map(|record| record.enrollment_id.clone()).collect();
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

    let records: Vec<repositories::attendance::UpsertRecord<'_>> = payload
        .records
        .iter()
        .zip(arrival_times.iter())
        .map(|(record, arrival)| repositories::attendance::UpsertRecord {
            enrollment_id: &record.enrollment_id,
            status: record.status,
            arrival_time: *arrival,
            notes: record.notes.as_deref(),
        })
        .collect();

    repositories::attendance::save_batch(
        state.db(),
        date,
        &auth.user.id,
        &records,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save attendance batch"))?;

    tracing::info!(
        user_id = %auth.user.id,
        group_id = %group.id,
        records = records.len(),
        action = "attendance_save",
        "Attendance batch saved"
    );

    Ok(Json(SaveBatchResponse { saved: records.len() }))
}

async fn stats(
    Path(group_id): Path<String>,
    Query(params): Query<StatsQuery>,
    CurrentUser(auth): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttendanceStatsResponse>, ApiError> {
    let start_date = parse_date(&params.start_date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid start_date '{}'", params.start_date)))?;
    let end_date = parse_date(&params.end_date)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid end_date '{}'", params.end_date)))?;

    if end_date < start_date {
        return Err(ApiError::BadRequest("end_date must not precede start_date".to_string()));
    }

    let group = fetch_group(&state, &group_id).await?;
    require_group_teacher(&auth, &group)?;

    let total_classes =
        repositories::attendance::count_distinct_dates(state.db(), &group.id, start_date, end_date)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to count class dates"))?;

    let rows =
        repositories::attendance::range_counts(state.db(), &group.id, start_date, end_date)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load attendance counts"))?;

    Ok(Json(AttendanceStatsResponse {
        group_id: group.id,
        start_date: format_date(start_date),
        end_date: format_date(end_date),
        total_classes,
        students: rows
            .into_iter()
            .map(|row| StudentAttendanceStats::from_row(row, total_classes))
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support;

    #[tokio::test]
    async fn roster_reports_null_before_attendance_is_taken() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/attendance/{}/date?date=2025-03-10", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("roster");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["records"][0]["status"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn batch_upsert_overwrites_instead_of_duplicating() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let save = |status: &str, arrival: Option<&str>| {
            let mut record = json!({
                "enrollment_id": fixture.enrollment.id,
                "status": status,
            });
            if let Some(arrival) = arrival {
                record["arrival_time"] = json!(arrival);
            }
            test_support::json_request(
                Method::POST,
                "/api/v1/attendance/batch",
                Some(&token),
                Some(json!({
                    "group_id": fixture.group.id,
                    "date": "2025-03-10",
                    "records": [record],
                })),
            )
        };

        let response = ctx.app.clone().oneshot(save("ABSENT", None)).await.expect("first save");
        assert_eq!(response.status(), StatusCode::OK);

        // Same (enrollment, date) pair again: the row is overwritten.
        let response =
            ctx.app.clone().oneshot(save("LATE", Some("07:45"))).await.expect("second save");
        assert_eq!(response.status(), StatusCode::OK);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/attendance/{}/date?date=2025-03-10", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("roster");

        let body = test_support::read_json(response).await;
        assert_eq!(body["records"].as_array().unwrap().len(), 1);
        assert_eq!(body["records"][0]["status"], "LATE");
        assert_eq!(body["records"][0]["arrival_time"], "07:45:00");
    }

    #[tokio::test]
    async fn malformed_batch_persists_nothing() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/attendance/batch",
                Some(&token),
                Some(json!({
                    "group_id": fixture.group.id,
                    "date": "2025-03-11",
                    "records": [
                        {"enrollment_id": fixture.enrollment.id, "status": "PRESENT"},
                        {"enrollment_id": "not-an-enrollment", "status": "PRESENT"},
                    ],
                })),
            ))
            .await
            .expect("bad batch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // The valid record in the same batch must not have been written.
        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/attendance/{}/date?date=2025-03-11", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("roster");
        let body = test_support::read_json(response).await;
        assert_eq!(body["records"][0]["status"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn stats_report_zero_rate_without_classes() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!(
                    "/api/v1/attendance/{}/stats?start_date=2025-03-01&end_date=2025-03-31",
                    fixture.group.id
                ),
                Some(&token),
                None,
            ))
            .await
            .expect("stats");

        let status = response.status();
        let body = test_support::read_json(response).await;
        assert_eq!(status, StatusCode::OK, "response: {body}");
        assert_eq!(body["total_classes"], 0);
        assert_eq!(body["students"][0]["attendance_rate"], "0.0");
    }

    #[tokio::test]
    async fn stats_count_late_as_attended() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;
        let token = test_support::bearer_token_for(&fixture.teacher_user, ctx.state.settings());

        for (date, status) in
            [("2025-03-10", "PRESENT"), ("2025-03-11", "LATE"), ("2025-03-12", "ABSENT")]
        {
            let response = ctx
                .app
                .clone()
                .oneshot(test_support::json_request(
                    Method::POST,
                    "/api/v1/attendance/batch",
                    Some(&token),
                    Some(json!({
                        "group_id": fixture.group.id,
                        "date": date,
                        "records": [
                            {"enrollment_id": fixture.enrollment.id, "status": status},
                        ],
                    })),
                ))
                .await
                .expect("save");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!(
                    "/api/v1/attendance/{}/stats?start_date=2025-03-01&end_date=2025-03-31",
                    fixture.group.id
                ),
                Some(&token),
                None,
            ))
            .await
            .expect("stats");

        let body = test_support::read_json(response).await;
        assert_eq!(body["total_classes"], 3);
        let student = &body["students"][0];
        assert_eq!(student["present"], 1);
        assert_eq!(student["late"], 1);
        assert_eq!(student["absent"], 1);
        assert_eq!(student["attendance_rate"], "66.7");
    }

    #[tokio::test]
    async fn foreign_teacher_cannot_read_the_roster() {
        let ctx = test_support::setup_test_context().await;
        let fixture = test_support::academic_fixture(&ctx).await;

        let other = test_support::insert_user_with_roles(
            ctx.state.db(),
            "nosyteacher",
            "nosy@example.com",
            "Nosy",
            "Teacher",
            "nosy-pass-1",
            &[crate::db::types::RoleName::Teacher],
        )
        .await;
        let token = test_support::bearer_token_for(&other, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/attendance/{}/date?date=2025-03-10", fixture.group.id),
                Some(&token),
                None,
            ))
            .await
            .expect("roster");

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
