use sqlx::{PgPool, Postgres, QueryBuilder};
use time::Date;

use crate::db::models::Group;
use crate::db::types::{EnrollmentStatus, GroupStatus};

const COLUMNS: &str = "\
    id, level_id, teacher_id, classroom_id, code, capacity, start_date, end_date, \
    status, created_at, updated_at";

/// Group joined with its assigned teacher's user, for ownership checks and
/// display. `teacher_user_id` is `None` when no teacher is assigned.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct GroupWithTeacher {
    pub(crate) id: String,
    pub(crate) level_id: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) classroom_id: Option<String>,
    pub(crate) code: String,
    pub(crate) capacity: i32,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) status: GroupStatus,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) teacher_user_id: Option<String>,
    pub(crate) teacher_first_name: Option<String>,
    pub(crate) teacher_last_name: Option<String>,
}

pub(crate) struct CreateGroup<'a> {
    pub(crate) id: &'a str,
    pub(crate) level_id: &'a str,
    pub(crate) teacher_id: Option<&'a str>,
    pub(crate) classroom_id: Option<&'a str>,
    pub(crate) code: &'a str,
    pub(crate) capacity: i32,
    pub(crate) start_date: Date,
    pub(crate) end_date: Date,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateGroup<'_>) -> Result<Group, sqlx::Error> {
    sqlx::query_as::<_, Group>(&format!(
        "INSERT INTO groups (
            id, level_id, teacher_id, classroom_id, code, capacity,
            start_date, end_date, status, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,'active',$9,$10)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.level_id)
    .bind(params.teacher_id)
    .bind(params.classroom_id)
    .bind(params.code)
    .bind(params.capacity)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Group>, sqlx::Error> {
    sqlx::query_as::<_, Group>(&format!("SELECT {COLUMNS} FROM groups WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn fetch_one_by_id(pool: &PgPool, id: &str) -> Result<Group, sqlx::Error> {
    sqlx::query_as::<_, Group>(&format!("SELECT {COLUMNS} FROM groups WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn find_with_teacher(
    pool: &PgPool,
    id: &str,
) -> Result<Option<GroupWithTeacher>, sqlx::Error> {
    sqlx::query_as::<_, GroupWithTeacher>(
        "SELECT g.id, g.level_id, g.teacher_id, g.classroom_id, g.code, g.capacity,
                g.start_date, g.end_date, g.status, g.created_at,
                t.user_id AS teacher_user_id,
                u.first_name AS teacher_first_name,
                u.last_name AS teacher_last_name
         FROM groups g
         LEFT JOIN teachers t ON t.id = g.teacher_id
         LEFT JOIN users u ON u.id = t.user_id
         WHERE g.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct GroupListFilter {
    pub(crate) level_id: Option<String>,
    pub(crate) teacher_id: Option<String>,
    pub(crate) status: Option<GroupStatus>,
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: GroupListFilter,
) -> Result<Vec<Group>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM groups WHERE TRUE"));

    if let Some(level_id) = filter.level_id.as_ref() {
        builder.push(" AND level_id = ");
        builder.push_bind(level_id);
    }
    if let Some(teacher_id) = filter.teacher_id.as_ref() {
        builder.push(" AND teacher_id = ");
        builder.push_bind(teacher_id);
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ");
        builder.push_bind(status);
    }

    builder.push(" ORDER BY start_date DESC, code");

    builder.build_query_as::<Group>().fetch_all(pool).await
}

pub(crate) struct UpdateGroup {
    pub(crate) teacher_id: Option<String>,
    pub(crate) classroom_id: Option<String>,
    pub(crate) code: Option<String>,
    pub(crate) capacity: Option<i32>,
    pub(crate) start_date: Option<Date>,
    pub(crate) end_date: Option<Date>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateGroup,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE groups SET
            teacher_id = COALESCE($1, teacher_id),
            classroom_id = COALESCE($2, classroom_id),
            code = COALESCE($3, code),
            capacity = COALESCE($4, capacity),
            start_date = COALESCE($5, start_date),
            end_date = COALESCE($6, end_date),
            updated_at = $7
         WHERE id = $8",
    )
    .bind(params.teacher_id)
    .bind(params.classroom_id)
    .bind(params.code)
    .bind(params.capacity)
    .bind(params.start_date)
    .bind(params.end_date)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn update_status(
    pool: &PgPool,
    id: &str,
    status: GroupStatus,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE groups SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(status)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Closes the group and completes its active enrollments in one transaction.
/// Cancelled enrollments are left untouched. Returns the number of
/// enrollments transitioned.
pub(crate) async fn close_with_enrollments(
    pool: &PgPool,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE groups SET status = $1, updated_at = $2 WHERE id = $3")
        .bind(GroupStatus::Completed)
        .bind(updated_at)
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query(
        "UPDATE enrollments SET status = $1, updated_at = $2
         WHERE group_id = $3 AND status = $4",
    )
    .bind(EnrollmentStatus::Completed)
    .bind(updated_at)
    .bind(id)
    .bind(EnrollmentStatus::Active)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(result.rows_affected())
}

pub(crate) async fn count_active_enrollments(
    pool: &PgPool,
    group_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM enrollments WHERE group_id = $1 AND status = $2",
    )
    .bind(group_id)
    .bind(EnrollmentStatus::Active)
    .fetch_one(pool)
    .await
}
