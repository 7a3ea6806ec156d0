use sqlx::PgPool;

use crate::db::models::CourseOffering;

const COLUMNS: &str =
    "id, course_code, title, session_start, session_end, created_by, created_at, updated_at";

pub(crate) struct CreateOffering<'a> {
    pub(crate) id: &'a str,
    pub(crate) course_code: &'a str,
    pub(crate) title: &'a str,
    pub(crate) session_start: time::PrimitiveDateTime,
    pub(crate) session_end: time::PrimitiveDateTime,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateOffering<'_>,
) -> Result<CourseOffering, sqlx::Error> {
    sqlx::query_as::<_, CourseOffering>(&format!(
        "INSERT INTO course_offerings (
            id, course_code, title, session_start, session_end, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.course_code)
    .bind(params.title)
    .bind(params.session_start)
    .bind(params.session_end)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    offering_id: &str,
) -> Result<Option<CourseOffering>, sqlx::Error> {
    sqlx::query_as::<_, CourseOffering>(&format!(
        "SELECT {COLUMNS} FROM course_offerings WHERE id = $1"
    ))
    .bind(offering_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<CourseOffering>, sqlx::Error> {
    sqlx::query_as::<_, CourseOffering>(&format!(
        "SELECT {COLUMNS} FROM course_offerings ORDER BY created_at DESC LIMIT $1 OFFSET $2"
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM course_offerings").fetch_one(pool).await
}
