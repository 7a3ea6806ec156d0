use sqlx::PgPool;

use crate::db::models::QuizAttempt;
use crate::db::types::AttemptStatus;

const COLUMNS: &str = "\
    id, quiz_id, student_id, status, started_at, submitted_at, total_score, \
    graded_by, created_at, updated_at";

/// Opens an attempt. The partial unique index on in-progress rows makes
/// concurrent starts race-safe: the loser gets `None` back.
pub(crate) async fn start(
    pool: &PgPool,
    id: &str,
    quiz_id: &str,
    student_id: &str,
    now: time::PrimitiveDateTime,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (id, quiz_id, student_id, status, started_at, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$5,$5)
         ON CONFLICT (quiz_id, student_id) WHERE status = 'in_progress' DO NOTHING
         RETURNING {COLUMNS}",
    ))
    .bind(id)
    .bind(quiz_id)
    .bind(student_id)
    .bind(AttemptStatus::InProgress)
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(attempt_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_for_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE quiz_id = $1 ORDER BY started_at"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_student(
    pool: &PgPool,
    quiz_id: &str,
    student_id: &str,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts
         WHERE quiz_id = $1 AND student_id = $2
         ORDER BY started_at"
    ))
    .bind(quiz_id)
    .bind(student_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_for_quiz(pool: &PgPool, quiz_id: &str) -> Result<bool, sqlx::Error> {
    let found =
        sqlx::query_scalar::<_, String>("SELECT id FROM quiz_attempts WHERE quiz_id = $1 LIMIT 1")
            .bind(quiz_id)
            .fetch_optional(pool)
            .await?;
    Ok(found.is_some())
}

/// Closes an in-progress attempt. The status guard keeps a concurrent
/// submit and expiry sweep from both claiming the row.
pub(crate) async fn close(
    pool: &PgPool,
    attempt_id: &str,
    status: AttemptStatus,
    submitted_at: time::PrimitiveDateTime,
    total_score: Option<f64>,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "UPDATE quiz_attempts SET
            status = $1,
            submitted_at = $2,
            total_score = $3,
            updated_at = $2
         WHERE id = $4 AND status = $5
         RETURNING {COLUMNS}",
    ))
    .bind(status)
    .bind(submitted_at)
    .bind(total_score)
    .bind(attempt_id)
    .bind(AttemptStatus::InProgress)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn set_grade(
    pool: &PgPool,
    attempt_id: &str,
    total_score: f64,
    graded_by: &str,
    now: time::PrimitiveDateTime,
) -> Result<QuizAttempt, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "UPDATE quiz_attempts SET
            status = $1,
            total_score = $2,
            graded_by = $3,
            updated_at = $4
         WHERE id = $5
         RETURNING {COLUMNS}",
    ))
    .bind(AttemptStatus::Graded)
    .bind(total_score)
    .bind(graded_by)
    .bind(now)
    .bind(attempt_id)
    .fetch_one(pool)
    .await
}
