use sqlx::PgPool;

use crate::db::models::Quiz;
use crate::db::types::QuizStatus;

const COLUMNS: &str = "\
    id, offering_id, assignment_id, title, description, opens_at, closes_at, \
    duration_minutes, status, published_at, created_by, created_at, updated_at";

pub(crate) struct CreateQuiz<'a> {
    pub(crate) id: &'a str,
    pub(crate) offering_id: &'a str,
    pub(crate) assignment_id: Option<&'a str>,
    pub(crate) title: &'a str,
    pub(crate) description: Option<&'a str>,
    pub(crate) opens_at: time::PrimitiveDateTime,
    pub(crate) closes_at: time::PrimitiveDateTime,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateQuiz<'_>) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, offering_id, assignment_id, title, description, opens_at, closes_at,
            duration_minutes, status, created_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.offering_id)
    .bind(params.assignment_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.opens_at)
    .bind(params.closes_at)
    .bind(params.duration_minutes)
    .bind(QuizStatus::Draft)
    .bind(params.created_by)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, quiz_id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(quiz_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_offering(
    pool: &PgPool,
    offering_id: &str,
    only_published: bool,
) -> Result<Vec<Quiz>, sqlx::Error> {
    if only_published {
        sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {COLUMNS} FROM quizzes
             WHERE offering_id = $1 AND status = $2
             ORDER BY opens_at, created_at"
        ))
        .bind(offering_id)
        .bind(QuizStatus::Published)
        .fetch_all(pool)
        .await
    } else {
        sqlx::query_as::<_, Quiz>(&format!(
            "SELECT {COLUMNS} FROM quizzes WHERE offering_id = $1 ORDER BY opens_at, created_at"
        ))
        .bind(offering_id)
        .fetch_all(pool)
        .await
    }
}

pub(crate) struct UpdateQuiz {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) opens_at: Option<time::PrimitiveDateTime>,
    pub(crate) closes_at: Option<time::PrimitiveDateTime>,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

pub(crate) async fn update(
    pool: &PgPool,
    quiz_id: &str,
    params: UpdateQuiz,
) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET
            title = COALESCE($1, title),
            description = COALESCE($2, description),
            opens_at = COALESCE($3, opens_at),
            closes_at = COALESCE($4, closes_at),
            duration_minutes = COALESCE($5, duration_minutes),
            updated_at = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.title)
    .bind(params.description)
    .bind(params.opens_at)
    .bind(params.closes_at)
    .bind(params.duration_minutes)
    .bind(params.updated_at)
    .bind(quiz_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_status(
    pool: &PgPool,
    quiz_id: &str,
    status: QuizStatus,
    published_at: Option<time::PrimitiveDateTime>,
    now: time::PrimitiveDateTime,
) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "UPDATE quizzes SET status = $1, published_at = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(published_at)
    .bind(now)
    .bind(quiz_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete(pool: &PgPool, quiz_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM quizzes WHERE id = $1").bind(quiz_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
