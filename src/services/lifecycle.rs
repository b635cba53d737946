use sqlx::PgPool;
use thiserror::Error;

use crate::core::time::primitive_now_utc;
use crate::db::models::Group;
use crate::db::types::{GroupStatus, NotificationKind, RoleName};
use crate::repositories;
use crate::services::notifications;

/// Group lifecycle: active -> grades_submitted -> completed, monotonic.
#[derive(Debug, Error)]
pub(crate) enum LifecycleError {
    #[error("group not found")]
    GroupNotFound,
    #[error("group has no assigned teacher")]
    MissingTeacher,
    #[error("caller is not the assigned teacher")]
    NotAssignedTeacher,
    #[error("grades were already submitted for this group")]
    GradesAlreadySubmitted,
    #[error("group is already completed")]
    AlreadyCompleted,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Marks the group's grades as submitted. Only the assigned teacher may do
/// this, and only while the group is still active. The admin notification
/// fan-out is best-effort: its failure is logged and counted, never
/// propagated.
pub(crate) async fn submit_grades(
    pool: &PgPool,
    group_id: &str,
    caller_user_id: &str,
) -> Result<Group, LifecycleError> {
    let group = repositories::groups::find_with_teacher(pool, group_id)
        .await?
        .ok_or(LifecycleError::GroupNotFound)?;

    let Some(teacher_user_id) = group.teacher_user_id.as_deref() else {
        return Err(LifecycleError::MissingTeacher);
    };

    if teacher_user_id != caller_user_id {
        return Err(LifecycleError::NotAssignedTeacher);
    }

    match group.status {
        GroupStatus::Active => {}
        GroupStatus::GradesSubmitted => return Err(LifecycleError::GradesAlreadySubmitted),
        GroupStatus::Completed => return Err(LifecycleError::AlreadyCompleted),
    }

    let now = primitive_now_utc();
    repositories::groups::update_status(pool, group_id, GroupStatus::GradesSubmitted, now).await?;

    let teacher_name = match (&group.teacher_first_name, &group.teacher_last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        _ => "A teacher".to_string(),
    };
    let title = "Grades submitted".to_string();
    let message = format!("{teacher_name} submitted grades for group {}", group.code);

    if let Err(err) = notifications::broadcast_to_role(
        pool,
        RoleName::Admin,
        &title,
        &message,
        NotificationKind::Info,
    )
    .await
    {
        metrics::counter!("notification_fanout_failures_total").increment(1);
        tracing::warn!(
            error = %err,
            group_id = %group_id,
            "Failed to notify admins about grade submission"
        );
    }

    Ok(repositories::groups::fetch_one_by_id(pool, group_id).await?)
}

/// Completes the group and every active enrollment under it, atomically.
/// Cancelled enrollments keep their status. Returns the updated group and
/// the number of enrollments completed.
pub(crate) async fn close_group(
    pool: &PgPool,
    group_id: &str,
) -> Result<(Group, u64), LifecycleError> {
    let group =
        repositories::groups::find_by_id(pool, group_id).await?.ok_or(LifecycleError::GroupNotFound)?;

    if group.status == GroupStatus::Completed {
        return Err(LifecycleError::AlreadyCompleted);
    }

    let now = primitive_now_utc();
    let completed = repositories::groups::close_with_enrollments(pool, group_id, now).await?;

    tracing::info!(
        group_id = %group_id,
        enrollments_completed = completed,
        action = "group_close",
        "Group closed"
    );

    let group = repositories::groups::fetch_one_by_id(pool, group_id).await?;
    Ok((group, completed))
}
