use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::QuizAnswer;

const COLUMNS: &str = "\
    id, attempt_id, question_id, student_id, selected_option_id, answer_text, \
    is_correct, score_awarded, created_at, updated_at";

pub(crate) struct RecordAnswer<'a> {
    pub(crate) attempt_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) selected_option_id: Option<&'a str>,
    pub(crate) answer_text: Option<&'a str>,
    pub(crate) now: time::PrimitiveDateTime,
}

/// Saves an answer; re-answering the same question overwrites the prior
/// row. Any scoring already stored is cleared since the answer changed.
pub(crate) async fn upsert(
    pool: &PgPool,
    params: RecordAnswer<'_>,
) -> Result<QuizAnswer, sqlx::Error> {
    sqlx::query_as::<_, QuizAnswer>(&format!(
        "INSERT INTO quiz_answers (
            id, attempt_id, question_id, student_id, selected_option_id, answer_text,
            created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         ON CONFLICT (attempt_id, question_id) DO UPDATE SET
            selected_option_id = EXCLUDED.selected_option_id,
            answer_text = EXCLUDED.answer_text,
            is_correct = NULL,
            score_awarded = NULL,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.attempt_id)
    .bind(params.question_id)
    .bind(params.student_id)
    .bind(params.selected_option_id)
    .bind(params.answer_text)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_attempt(
    pool: &PgPool,
    attempt_id: &str,
) -> Result<Vec<QuizAnswer>, sqlx::Error> {
    sqlx::query_as::<_, QuizAnswer>(&format!(
        "SELECT {COLUMNS} FROM quiz_answers WHERE attempt_id = $1 ORDER BY created_at"
    ))
    .bind(attempt_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn set_score(
    pool: &PgPool,
    answer_id: &str,
    is_correct: Option<bool>,
    score_awarded: Option<f64>,
    now: time::PrimitiveDateTime,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quiz_answers SET is_correct = $1, score_awarded = $2, updated_at = $3 WHERE id = $4",
    )
    .bind(is_correct)
    .bind(score_awarded)
    .bind(now)
    .bind(answer_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub(crate) async fn total_awarded(pool: &PgPool, attempt_id: &str) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(COALESCE(score_awarded, 0)), 0) FROM quiz_answers WHERE attempt_id = $1",
    )
    .bind(attempt_id)
    .fetch_one(pool)
    .await
}
