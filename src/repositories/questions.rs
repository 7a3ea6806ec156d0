use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{Question, QuestionOption};
use crate::db::types::QuestionKind;

const QUESTION_COLUMNS: &str =
    "id, quiz_id, kind, prompt, points, position, created_at, updated_at";
const OPTION_COLUMNS: &str = "id, question_id, label, is_correct, position, created_at";

pub(crate) struct OptionSpec {
    pub(crate) label: String,
    pub(crate) is_correct: bool,
}

pub(crate) struct CreateQuestion<'a> {
    pub(crate) id: &'a str,
    pub(crate) quiz_id: &'a str,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: &'a str,
    pub(crate) points: f64,
    pub(crate) position: i32,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<(Question, Vec<QuestionOption>), sqlx::Error> {
    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (id, quiz_id, kind, prompt, points, position, created_at, updated_at)
         VALUES ($1,$2,$3,$4,$5,$6,$7,$7)
         RETURNING {QUESTION_COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.kind)
    .bind(params.prompt)
    .bind(params.points)
    .bind(params.position)
    .bind(params.created_at)
    .fetch_one(&mut *tx)
    .await?;

    let mut options = Vec::with_capacity(params.options.len());
    for (index, spec) in params.options.into_iter().enumerate() {
        let option = sqlx::query_as::<_, QuestionOption>(&format!(
            "INSERT INTO question_options (id, question_id, label, is_correct, position, created_at)
             VALUES ($1,$2,$3,$4,$5,$6)
             RETURNING {OPTION_COLUMNS}",
        ))
        .bind(Uuid::new_v4().to_string())
        .bind(params.id)
        .bind(spec.label)
        .bind(spec.is_correct)
        .bind(index as i32)
        .bind(params.created_at)
        .fetch_one(&mut *tx)
        .await?;
        options.push(option);
    }

    tx.commit().await?;

    Ok((question, options))
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    question_id: &str,
) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1"
    ))
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {QUESTION_COLUMNS} FROM questions WHERE quiz_id = $1 ORDER BY position, created_at"
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_options_for_quiz(
    pool: &PgPool,
    quiz_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT o.{} FROM question_options o
         JOIN questions q ON q.id = o.question_id
         WHERE q.quiz_id = $1
         ORDER BY q.position, o.position",
        OPTION_COLUMNS.replace(", ", ", o."),
    ))
    .bind(quiz_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_options_for_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<Vec<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE question_id = $1 ORDER BY position"
    ))
    .bind(question_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn find_option(
    pool: &PgPool,
    question_id: &str,
    option_id: &str,
) -> Result<Option<QuestionOption>, sqlx::Error> {
    sqlx::query_as::<_, QuestionOption>(&format!(
        "SELECT {OPTION_COLUMNS} FROM question_options WHERE id = $1 AND question_id = $2"
    ))
    .bind(option_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}

pub(crate) struct UpdateQuestion {
    pub(crate) prompt: Option<String>,
    pub(crate) points: Option<f64>,
    pub(crate) position: Option<i32>,
    pub(crate) options: Option<Vec<OptionSpec>>,
    pub(crate) updated_at: time::PrimitiveDateTime,
}

/// Updates a question in place. When `options` is present the existing
/// option set is replaced wholesale inside the same transaction.
pub(crate) async fn update(
    pool: &PgPool,
    question_id: &str,
    params: UpdateQuestion,
) -> Result<Question, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let question = sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            prompt = COALESCE($1, prompt),
            points = COALESCE($2, points),
            position = COALESCE($3, position),
            updated_at = $4
         WHERE id = $5
         RETURNING {QUESTION_COLUMNS}",
    ))
    .bind(params.prompt)
    .bind(params.points)
    .bind(params.position)
    .bind(params.updated_at)
    .bind(question_id)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(options) = params.options {
        sqlx::query("DELETE FROM question_options WHERE question_id = $1")
            .bind(question_id)
            .execute(&mut *tx)
            .await?;

        for (index, spec) in options.into_iter().enumerate() {
            sqlx::query(
                "INSERT INTO question_options (id, question_id, label, is_correct, position, created_at)
                 VALUES ($1,$2,$3,$4,$5,$6)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(question_id)
            .bind(spec.label)
            .bind(spec.is_correct)
            .bind(index as i32)
            .bind(params.updated_at)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    Ok(question)
}

pub(crate) async fn delete(pool: &PgPool, question_id: &str) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM questions WHERE id = $1").bind(question_id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn total_points_for_quiz(pool: &PgPool, quiz_id: &str) -> Result<f64, sqlx::Error> {
    sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(points), 0) FROM questions WHERE quiz_id = $1",
    )
    .bind(quiz_id)
    .fetch_one(pool)
    .await
}
