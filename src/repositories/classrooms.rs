use sqlx::PgPool;

use crate::db::models::Classroom;

const COLUMNS: &str = "id, name, capacity, is_active, created_at, updated_at";

pub(crate) struct CreateClassroom<'a> {
    pub(crate) id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) capacity: i32,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateClassroom<'_>,
) -> Result<Classroom, sqlx::Error> {
    sqlx::query_as::<_, Classroom>(&format!(
        "INSERT INTO classrooms (id, name, capacity, is_active, created_at, updated_at)
         VALUES ($1,$2,$3,TRUE,$4,$5)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.name)
    .bind(params.capacity)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Classroom>, sqlx::Error> {
    sqlx::query_as::<_, Classroom>(&format!("SELECT {COLUMNS} FROM classrooms WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    include_inactive: bool,
) -> Result<Vec<Classroom>, sqlx::Error> {
    let sql = if include_inactive {
        format!("SELECT {COLUMNS} FROM classrooms ORDER BY name")
    } else {
        format!("SELECT {COLUMNS} FROM classrooms WHERE is_active = TRUE ORDER BY name")
    };
    sqlx::query_as::<_, Classroom>(&sql).fetch_all(pool).await
}

pub(crate) struct UpdateClassroom {
    pub(crate) name: Option<String>,
    pub(crate) capacity: Option<i32>,
    pub(crate) is_active: Option<bool>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateClassroom,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE classrooms SET
            name = COALESCE($1, name),
            capacity = COALESCE($2, capacity),
            is_active = COALESCE($3, is_active),
            updated_at = $4
         WHERE id = $5",
    )
    .bind(params.name)
    .bind(params.capacity)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn deactivate(
    pool: &PgPool,
    id: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE classrooms SET is_active = FALSE, updated_at = $1 WHERE id = $2")
            .bind(updated_at)
            .bind(id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
