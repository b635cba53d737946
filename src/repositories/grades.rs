use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct GradeWithStudent {
    pub(crate) id: String,
    pub(crate) enrollment_id: String,
    pub(crate) student_id: String,
    pub(crate) period: i32,
    pub(crate) score: f64,
    pub(crate) comments: Option<String>,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
}

pub(crate) struct UpsertGrade<'a> {
    pub(crate) enrollment_id: &'a str,
    pub(crate) score: f64,
    pub(crate) comments: Option<&'a str>,
}

/// Upserts the whole batch keyed by (enrollment_id, period) inside one
/// transaction.
pub(crate) async fn save_batch(
    pool: &PgPool,
    period: i32,
    graded_by: &str,
    grades: &[UpsertGrade<'_>],
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for grade in grades {
        sqlx::query(
            "INSERT INTO grades (
                id, enrollment_id, period, score, comments, graded_by, created_at, updated_at
             ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
             ON CONFLICT (enrollment_id, period)
             DO UPDATE SET score = EXCLUDED.score,
                           comments = EXCLUDED.comments,
                           graded_by = EXCLUDED.graded_by,
                           updated_at = EXCLUDED.updated_at",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(grade.enrollment_id)
        .bind(period)
        .bind(grade.score)
        .bind(grade.comments)
        .bind(graded_by)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub(crate) async fn list_for_group(
    pool: &PgPool,
    group_id: &str,
    period: Option<i32>,
) -> Result<Vec<GradeWithStudent>, sqlx::Error> {
    sqlx::query_as::<_, GradeWithStudent>(
        "SELECT g.id, g.enrollment_id, s.id AS student_id, g.period, g.score, g.comments,
                u.first_name, u.last_name
         FROM grades g
         JOIN enrollments e ON e.id = g.enrollment_id
         JOIN students s ON s.id = e.student_id
         JOIN users u ON u.id = s.user_id
         WHERE e.group_id = $1 AND ($2::int IS NULL OR g.period = $2)
         ORDER BY u.last_name, u.first_name, g.period",
    )
    .bind(group_id)
    .bind(period)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct StudentGradeRow {
    pub(crate) id: String,
    pub(crate) enrollment_id: String,
    pub(crate) group_id: String,
    pub(crate) group_code: String,
    pub(crate) period: i32,
    pub(crate) score: f64,
    pub(crate) comments: Option<String>,
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    student_id: &str,
) -> Result<Vec<StudentGradeRow>, sqlx::Error> {
    sqlx::query_as::<_, StudentGradeRow>(
        "SELECT g.id, g.enrollment_id, e.group_id, gr.code AS group_code,
                g.period, g.score, g.comments
         FROM grades g
         JOIN enrollments e ON e.id = g.enrollment_id
         JOIN groups gr ON gr.id = e.group_id
         WHERE e.student_id = $1
         ORDER BY g.created_at DESC",
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
}
