use sqlx::PgPool;

/// Revenue rollup per active course: agreed prices summed over every
/// non-cancelled enrollment reachable through the course's levels and
/// groups, plus the distinct student count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct CourseRevenueRow {
    pub(crate) course_id: String,
    pub(crate) course_name: String,
    pub(crate) total_revenue: f64,
    pub(crate) student_count: i64,
}

pub(crate) async fn revenue_by_course(
    pool: &PgPool,
) -> Result<Vec<CourseRevenueRow>, sqlx::Error> {
    sqlx::query_as::<_, CourseRevenueRow>(
        "SELECT c.id AS course_id, c.name AS course_name,
                COALESCE(SUM(e.agreed_price), 0) AS total_revenue,
                COUNT(DISTINCT e.student_id) AS student_count
         FROM courses c
         LEFT JOIN levels l ON l.course_id = c.id
         LEFT JOIN groups g ON g.level_id = l.id
         LEFT JOIN enrollments e ON e.group_id = g.id AND e.status <> 'cancelled'
         WHERE c.is_active = TRUE
         GROUP BY c.id, c.name
         ORDER BY total_revenue DESC, c.name",
    )
    .fetch_all(pool)
    .await
}
