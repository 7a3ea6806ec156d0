use std::collections::HashMap;

use time::PrimitiveDateTime;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{Quiz, QuizAttempt};
use crate::db::types::{AttemptStatus, NotificationKind};
use crate::repositories;
use crate::services::{attempt_windows, notifications, scoring};

pub(super) struct AttemptContext {
    pub(super) attempt: QuizAttempt,
    pub(super) quiz: Quiz,
    pub(super) deadline: PrimitiveDateTime,
}

pub(super) async fn load_attempt(
    state: &AppState,
    attempt_id: &str,
) -> Result<AttemptContext, ApiError> {
    let attempt = repositories::attempts::find_by_id(state.db(), attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;
    let quiz = repositories::quizzes::find_by_id(state.db(), &attempt.quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;
    let deadline =
        attempt_windows::attempt_deadline(attempt.started_at, quiz.closes_at, quiz.duration_minutes);

    Ok(AttemptContext { attempt, quiz, deadline })
}

/// Applies the expiry rule on read: an in-progress attempt whose deadline
/// has elapsed is closed and scored as if the student had submitted at
/// the deadline. Returns whether expiry fired.
pub(super) async fn settle_expiry(
    state: &AppState,
    ctx: AttemptContext,
) -> Result<(AttemptContext, bool), ApiError> {
    if ctx.attempt.status == AttemptStatus::InProgress
        && attempt_windows::is_past(primitive_now_utc(), ctx.deadline)
    {
        let attempt = finalize_attempt(state, &ctx.attempt, &ctx.quiz, ctx.deadline).await?;
        return Ok((AttemptContext { attempt, ..ctx }, true));
    }
    Ok((ctx, false))
}

/// Scores every answer and closes the attempt. Fully objective quizzes
/// come out graded with a Grade record written; quizzes with short
/// answers close as submitted and wait for staff.
pub(super) async fn finalize_attempt(
    state: &AppState,
    attempt: &QuizAttempt,
    quiz: &Quiz,
    submitted_at: PrimitiveDateTime,
) -> Result<QuizAttempt, ApiError> {
    let questions = repositories::questions::list_for_quiz(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    let options = repositories::questions::list_options_for_quiz(state.db(), &quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;
    let answers = repositories::answers::list_for_attempt(state.db(), &attempt.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;

    let mut options_by_question: HashMap<String, Vec<_>> = HashMap::new();
    for option in options {
        options_by_question.entry(option.question_id.clone()).or_default().push(option);
    }

    let now = primitive_now_utc();
    let mut scores = Vec::with_capacity(questions.len());
    for question in &questions {
        let own_options = options_by_question.get(&question.id).map(Vec::as_slice).unwrap_or(&[]);
        let answer = answers.iter().find(|answer| answer.question_id == question.id);
        let score = scoring::score_answer(question, own_options, answer);

        if let Some(answer) = answer {
            if question.kind.is_auto_gradable() {
                repositories::answers::set_score(
                    state.db(),
                    &answer.id,
                    score.is_correct,
                    score.awarded,
                    now,
                )
                .await
                .map_err(|e| ApiError::internal(e, "Failed to score answer"))?;
            }
        }
        scores.push(score);
    }

    let closed = if scoring::fully_auto_gradable(&questions) {
        let total = scoring::total_awarded(&scores);
        let closed = repositories::attempts::close(
            state.db(),
            &attempt.id,
            AttemptStatus::Graded,
            submitted_at,
            Some(total),
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close attempt"))?;

        if let Some(closed) = &closed {
            let max_points: f64 = questions.iter().map(|question| question.points).sum();
            let grade_value = scoring::format_score(total, max_points);
            repositories::grades::upsert(
                state.db(),
                repositories::grades::UpsertGrade {
                    student_id: &closed.student_id,
                    offering_id: &quiz.offering_id,
                    assignment_id: None,
                    quiz_id: Some(&quiz.id),
                    grade_value: &grade_value,
                    numeric_score: Some(total),
                    remarks: None,
                    graded_by: None,
                    now,
                },
            )
            .await
            .map_err(|e| ApiError::internal(e, "Failed to record grade"))?;

            notifications::notify(
                state.db(),
                &closed.student_id,
                NotificationKind::GradePosted,
                &notifications::grade_posted_message(&quiz.title, &grade_value),
            )
            .await;
        }
        closed
    } else {
        repositories::attempts::close(
            state.db(),
            &attempt.id,
            AttemptStatus::Submitted,
            submitted_at,
            None,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to close attempt"))?
    };

    match closed {
        Some(closed) => Ok(closed),
        // A concurrent submit or expiry already claimed the row.
        None => repositories::attempts::find_by_id(state.db(), &attempt.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
            .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string())),
    }
}
