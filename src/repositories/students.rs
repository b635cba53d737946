use sqlx::PgPool;
use time::Date;

use crate::db::models::{Guardian, Student};

const COLUMNS: &str = "id, user_id, birth_date, school_id, photo_key, created_at, updated_at";

pub(crate) struct CreateStudent<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) birth_date: Option<Date>,
    pub(crate) school_id: Option<&'a str>,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateStudent<'_>) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (id, user_id, birth_date, school_id, photo_key, created_at, updated_at)
         VALUES ($1,$2,$3,$4,NULL,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.birth_date)
    .bind(params.school_id)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_user_id(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE user_id = $1"))
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(pool: &PgPool) -> Result<Vec<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) struct UpdateStudent<'a> {
    pub(crate) birth_date: Option<Date>,
    pub(crate) school_id: Option<&'a str>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateStudent<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE students SET
            birth_date = COALESCE($1, birth_date),
            school_id = COALESCE($2, school_id),
            updated_at = $3
         WHERE id = $4",
    )
    .bind(params.birth_date)
    .bind(params.school_id)
    .bind(params.updated_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn set_photo_key(
    pool: &PgPool,
    id: &str,
    photo_key: &str,
    updated_at: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE students SET photo_key = $1, updated_at = $2 WHERE id = $3")
        .bind(photo_key)
        .bind(updated_at)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub(crate) async fn link_guardian(
    pool: &PgPool,
    student_id: &str,
    guardian_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_guardians (student_id, guardian_id)
         VALUES ($1, $2)
         ON CONFLICT (student_id, guardian_id) DO NOTHING",
    )
    .bind(student_id)
    .bind(guardian_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn unlink_guardian(
    pool: &PgPool,
    student_id: &str,
    guardian_id: &str,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM student_guardians WHERE student_id = $1 AND guardian_id = $2")
            .bind(student_id)
            .bind(guardian_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn list_guardians(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<Guardian>, sqlx::Error> {
    sqlx::query_as::<_, Guardian>(
        "SELECT g.id, g.user_id, g.phone, g.created_at, g.updated_at
         FROM guardians g
         JOIN student_guardians sg ON sg.guardian_id = g.id
         WHERE sg.student_id = $1
         ORDER BY g.created_at",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
