mod helpers;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_manage, require_participant, CurrentUser};
use crate::api::quizzes::fetch_quiz;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::User;
use crate::db::types::{AttemptStatus, NotificationKind, QuizStatus};
use crate::repositories;
use crate::schemas::attempt::{
    AnswerResponse, AnswerSubmit, AttemptDetailResponse, AttemptGradeRequest, AttemptResponse,
};
use crate::services::{attempt_windows, notifications, scoring};

use helpers::{finalize_attempt, load_attempt, settle_expiry, AttemptContext};

/// Routes mounted under `/quizzes/:quiz_id/attempts`.
pub(crate) fn collection_router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_attempt).get(list_attempts))
        .route("/me", get(my_attempts))
}

/// Routes mounted under `/attempts`.
pub(crate) fn item_router() -> Router<AppState> {
    Router::new()
        .route("/:attempt_id", get(get_attempt))
        .route("/:attempt_id/answers", post(record_answer))
        .route("/:attempt_id/submit", post(submit_attempt))
        .route("/:attempt_id/grade", post(grade_attempt))
}

async fn start_attempt(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<AttemptResponse>), ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_participant(&state, &user, &quiz.offering_id).await?;

    if quiz.status != QuizStatus::Published {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    let now = primitive_now_utc();
    if now < quiz.opens_at {
        return Err(ApiError::BadRequest("Quiz is not open yet".to_string()));
    }
    if attempt_windows::is_past(now, quiz.closes_at) {
        return Err(ApiError::DeadlineExceeded("Quiz window has closed".to_string()));
    }

    // Single attempt per student. A prior completed attempt blocks a
    // fresh start; the in-progress race is settled by the insert itself.
    let prior = repositories::attempts::list_for_student(state.db(), &quiz_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;
    if prior.iter().any(|attempt| attempt.status != AttemptStatus::InProgress) {
        return Err(ApiError::Conflict("Quiz already attempted".to_string()));
    }

    let attempt = repositories::attempts::start(
        state.db(),
        &Uuid::new_v4().to_string(),
        &quiz_id,
        &user.id,
        now,
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to start attempt"))?
    .ok_or_else(|| ApiError::Conflict("Attempt already in progress".to_string()))?;

    let deadline =
        attempt_windows::attempt_deadline(attempt.started_at, quiz.closes_at, quiz.duration_minutes);

    Ok((StatusCode::CREATED, Json(AttemptResponse::from_db(attempt, deadline))))
}

async fn list_attempts(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    let attempts = repositories::attempts::list_for_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    let mut responses = Vec::with_capacity(attempts.len());
    for attempt in attempts {
        let deadline = attempt_windows::attempt_deadline(
            attempt.started_at,
            quiz.closes_at,
            quiz.duration_minutes,
        );
        let ctx = AttemptContext { attempt, quiz: quiz.clone(), deadline };
        let (ctx, _) = settle_expiry(&state, ctx).await?;
        responses.push(AttemptResponse::from_db(ctx.attempt, deadline));
    }

    Ok(Json(responses))
}

async fn my_attempts(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_participant(&state, &user, &quiz.offering_id).await?;

    let attempts = repositories::attempts::list_for_student(state.db(), &quiz_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list attempts"))?;

    let mut responses = Vec::with_capacity(attempts.len());
    for attempt in attempts {
        let deadline = attempt_windows::attempt_deadline(
            attempt.started_at,
            quiz.closes_at,
            quiz.duration_minutes,
        );
        let ctx = AttemptContext { attempt, quiz: quiz.clone(), deadline };
        let (ctx, _) = settle_expiry(&state, ctx).await?;
        responses.push(AttemptResponse::from_db(ctx.attempt, deadline));
    }

    Ok(Json(responses))
}

async fn get_attempt(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptDetailResponse>, ApiError> {
    let ctx = load_attempt(&state, &attempt_id).await?;
    require_attempt_access(&state, &user, &ctx).await?;
    let (ctx, _) = settle_expiry(&state, ctx).await?;

    let answers = repositories::answers::list_for_attempt(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;

    Ok(Json(AttemptDetailResponse {
        attempt: AttemptResponse::from_db(ctx.attempt, ctx.deadline),
        answers: answers.into_iter().map(AnswerResponse::from_db).collect(),
    }))
}

async fn record_answer(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswerSubmit>,
) -> Result<Json<AnswerResponse>, ApiError> {
    let ctx = load_attempt(&state, &attempt_id).await?;
    if ctx.attempt.student_id != user.id {
        return Err(ApiError::Forbidden("Not your attempt"));
    }

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (ctx, expired) = settle_expiry(&state, ctx).await?;
    if expired {
        return Err(ApiError::ExpiredAttempt("Attempt deadline has passed".to_string()));
    }
    if ctx.attempt.status != AttemptStatus::InProgress {
        return Err(ApiError::Conflict("Attempt is already submitted".to_string()));
    }

    let question = repositories::questions::find_by_id(state.db(), &payload.question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .filter(|question| question.quiz_id == ctx.quiz.id)
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if question.kind.is_auto_gradable() {
        let option_id = payload
            .selected_option_id
            .as_deref()
            .ok_or_else(|| ApiError::BadRequest("selected_option_id is required".to_string()))?;
        repositories::questions::find_option(state.db(), &question.id, option_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch option"))?
            .ok_or_else(|| {
                ApiError::BadRequest("Option does not belong to this question".to_string())
            })?;
    } else if payload.answer_text.as_deref().map_or(true, |text| text.trim().is_empty()) {
        return Err(ApiError::BadRequest("answer_text is required".to_string()));
    }

    let answer = repositories::answers::upsert(
        state.db(),
        repositories::answers::RecordAnswer {
            attempt_id: &attempt_id,
            question_id: &question.id,
            student_id: &user.id,
            selected_option_id: payload.selected_option_id.as_deref(),
            answer_text: payload.answer_text.as_deref(),
            now: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record answer"))?;

    Ok(Json(AnswerResponse::from_db(answer)))
}

async fn submit_attempt(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let ctx = load_attempt(&state, &attempt_id).await?;
    if ctx.attempt.student_id != user.id {
        return Err(ApiError::Forbidden("Not your attempt"));
    }

    let (ctx, expired) = settle_expiry(&state, ctx).await?;
    if expired {
        return Err(ApiError::ExpiredAttempt("Attempt deadline has passed".to_string()));
    }
    if ctx.attempt.status != AttemptStatus::InProgress {
        return Err(ApiError::Conflict("Attempt is already submitted".to_string()));
    }

    let closed = finalize_attempt(&state, &ctx.attempt, &ctx.quiz, primitive_now_utc()).await?;

    Ok(Json(AttemptResponse::from_db(closed, ctx.deadline)))
}

/// Staff pass over a submitted attempt: score the short answers, recompute
/// the total from all answers, and write the canonical grade record.
async fn grade_attempt(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AttemptGradeRequest>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let ctx = load_attempt(&state, &attempt_id).await?;
    require_manage(&state, &user, &ctx.quiz.offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (ctx, _) = settle_expiry(&state, ctx).await?;
    if ctx.attempt.status == AttemptStatus::InProgress {
        return Err(ApiError::Conflict("Attempt has not been submitted yet".to_string()));
    }

    let answers = repositories::answers::list_for_attempt(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list answers"))?;

    let now = primitive_now_utc();
    for score in &payload.scores {
        let answer = answers
            .iter()
            .find(|answer| answer.id == score.answer_id)
            .ok_or_else(|| ApiError::NotFound("Answer not found on this attempt".to_string()))?;
        let question = repositories::questions::find_by_id(state.db(), &answer.question_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
            .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
        if score.score_awarded > question.points {
            return Err(ApiError::BadRequest(format!(
                "score_awarded for answer {} exceeds the question's {} points",
                score.answer_id, question.points
            )));
        }

        repositories::answers::set_score(
            state.db(),
            &score.answer_id,
            Some(score.score_awarded > 0.0),
            Some(score.score_awarded),
            now,
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to score answer"))?;
    }

    let total = repositories::answers::total_awarded(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to total attempt"))?;
    let graded = repositories::attempts::set_grade(state.db(), &attempt_id, total, &user.id, now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to grade attempt"))?;

    let max_points = repositories::questions::total_points_for_quiz(state.db(), &ctx.quiz.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to total points"))?;
    let grade_value = scoring::format_score(total, max_points);
    repositories::grades::upsert(
        state.db(),
        repositories::grades::UpsertGrade {
            student_id: &graded.student_id,
            offering_id: &ctx.quiz.offering_id,
            assignment_id: None,
            quiz_id: Some(&ctx.quiz.id),
            grade_value: &grade_value,
            numeric_score: Some(total),
            remarks: payload.remarks.as_deref(),
            graded_by: Some(&user.id),
            now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to record grade"))?;

    notifications::notify(
        state.db(),
        &graded.student_id,
        NotificationKind::GradePosted,
        &notifications::grade_posted_message(&ctx.quiz.title, &grade_value),
    )
    .await;

    Ok(Json(AttemptResponse::from_db(graded, ctx.deadline)))
}

/// Owner always; otherwise staff of the quiz's offering.
async fn require_attempt_access(
    state: &AppState,
    user: &User,
    ctx: &AttemptContext,
) -> Result<(), ApiError> {
    if ctx.attempt.student_id == user.id {
        return Ok(());
    }
    require_manage(state, user, &ctx.quiz.offering_id).await.map(|_| ())
}
