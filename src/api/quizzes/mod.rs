use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_manage, require_member, CurrentUser};
use crate::api::offerings::fetch_offering;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::Quiz;
use crate::db::types::{QuestionKind, QuizStatus};
use crate::repositories;
use crate::schemas::quiz::{
    OptionCreate, QuestionCreate, QuestionResponse, QuestionUpdate, QuizCreate, QuizDetailResponse,
    QuizResponse, QuizUpdate,
};
use crate::services::access_policy::{self, OfferingRelation};

/// Routes mounted under `/offerings/:offering_id/quizzes`.
pub(crate) fn collection_router() -> Router<AppState> {
    Router::new().route("/", post(create_quiz).get(list_quizzes))
}

/// Routes mounted under `/quizzes`.
pub(crate) fn item_router() -> Router<AppState> {
    Router::new()
        .route("/:quiz_id", get(get_quiz).patch(update_quiz).delete(delete_quiz))
        .route("/:quiz_id/publish", post(publish_quiz))
        .route("/:quiz_id/unpublish", post(unpublish_quiz))
        .route("/:quiz_id/questions", post(add_question))
        .route(
            "/:quiz_id/questions/:question_id",
            axum::routing::patch(update_question).delete(delete_question),
        )
}

async fn create_quiz(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    fetch_offering(&state, &offering_id).await?;
    require_manage(&state, &user, &offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if payload.closes_at <= payload.opens_at {
        return Err(ApiError::BadRequest("closes_at must be after opens_at".to_string()));
    }

    if let Some(assignment_id) = payload.assignment_id.as_deref() {
        let assignment = crate::api::assignments::fetch_assignment(&state, assignment_id).await?;
        if assignment.offering_id != offering_id {
            return Err(ApiError::BadRequest(
                "Linked assignment belongs to a different offering".to_string(),
            ));
        }
    }

    let now = primitive_now_utc();
    let quiz = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            id: &Uuid::new_v4().to_string(),
            offering_id: &offering_id,
            assignment_id: payload.assignment_id.as_deref(),
            title: &payload.title,
            description: payload.description.as_deref(),
            opens_at: to_primitive_utc(payload.opens_at),
            closes_at: to_primitive_utc(payload.closes_at),
            duration_minutes: payload.duration_minutes,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz))))
}

async fn list_quizzes(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    fetch_offering(&state, &offering_id).await?;
    let relation = require_member(&state, &user, &offering_id).await?;

    let only_published = !access_policy::can_manage_assessments(relation);
    let quizzes = repositories::quizzes::list_for_offering(state.db(), &offering_id, only_published)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list quizzes"))?;

    Ok(Json(quizzes.into_iter().map(QuizResponse::from_db).collect()))
}

/// Quiz detail. Staff see everything including answer keys; students see
/// questions without keys, and only once the window has opened.
async fn get_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizDetailResponse>, ApiError> {
    let (quiz, relation) = fetch_quiz_for_read(&state, &user, &quiz_id).await?;
    let is_staff = access_policy::can_manage_assessments(relation);

    let now = primitive_now_utc();
    let questions_visible = is_staff || now >= quiz.opens_at;

    let questions = if questions_visible {
        let questions = repositories::questions::list_for_quiz(state.db(), &quiz_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
        let options = repositories::questions::list_options_for_quiz(state.db(), &quiz_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

        let mut by_question: std::collections::HashMap<String, Vec<_>> =
            std::collections::HashMap::new();
        for option in options {
            by_question.entry(option.question_id.clone()).or_default().push(option);
        }

        questions
            .into_iter()
            .map(|question| {
                let own_options = by_question.remove(&question.id).unwrap_or_default();
                QuestionResponse::from_db(question, own_options, is_staff)
            })
            .collect()
    } else {
        Vec::new()
    };

    let total_points = repositories::questions::total_points_for_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to total points"))?;

    Ok(Json(QuizDetailResponse { quiz: QuizResponse::from_db(quiz), questions, total_points }))
}

async fn update_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let timing_changed = payload.opens_at.is_some()
        || payload.closes_at.is_some()
        || payload.duration_minutes.is_some();
    if timing_changed {
        let has_attempts = repositories::attempts::exists_for_quiz(state.db(), &quiz_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check attempts"))?;
        if has_attempts {
            return Err(ApiError::Conflict(
                "Quiz timing cannot change after attempts exist".to_string(),
            ));
        }
    }

    let opens_at = payload.opens_at.map(to_primitive_utc);
    let closes_at = payload.closes_at.map(to_primitive_utc);
    let effective_opens = opens_at.unwrap_or(quiz.opens_at);
    let effective_closes = closes_at.unwrap_or(quiz.closes_at);
    if effective_closes <= effective_opens {
        return Err(ApiError::BadRequest("closes_at must be after opens_at".to_string()));
    }

    let updated = repositories::quizzes::update(
        state.db(),
        &quiz_id,
        repositories::quizzes::UpdateQuiz {
            title: payload.title,
            description: payload.description,
            opens_at,
            closes_at,
            duration_minutes: payload.duration_minutes,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update quiz"))?;

    Ok(Json(QuizResponse::from_db(updated)))
}

async fn publish_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    if quiz.status == QuizStatus::Published {
        return Ok(Json(QuizResponse::from_db(quiz)));
    }

    let questions = repositories::questions::list_for_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list questions"))?;
    if questions.is_empty() {
        return Err(ApiError::BadRequest("Quiz has no questions".to_string()));
    }

    let now = primitive_now_utc();
    let updated =
        repositories::quizzes::set_status(state.db(), &quiz_id, QuizStatus::Published, Some(now), now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to publish quiz"))?;

    Ok(Json(QuizResponse::from_db(updated)))
}

/// Pulling a quiz back to draft is only possible while nobody has
/// started it.
async fn unpublish_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    let has_attempts = repositories::attempts::exists_for_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check attempts"))?;
    if has_attempts {
        return Err(ApiError::Conflict(
            "Quiz with attempts cannot be unpublished".to_string(),
        ));
    }

    let now = primitive_now_utc();
    let updated =
        repositories::quizzes::set_status(state.db(), &quiz_id, QuizStatus::Draft, None, now)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to unpublish quiz"))?;

    Ok(Json(QuizResponse::from_db(updated)))
}

async fn delete_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    let has_attempts = repositories::attempts::exists_for_quiz(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check attempts"))?;
    if has_attempts {
        return Err(ApiError::Conflict("Quiz with attempts cannot be deleted".to_string()));
    }

    repositories::quizzes::delete(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete quiz"))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn add_question(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    validate_question_shape(payload.kind, &payload.options)?;
    reject_when_attempted(&state, &quiz_id).await?;

    let question_id = Uuid::new_v4().to_string();
    let (question, options) = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &question_id,
            quiz_id: &quiz_id,
            kind: payload.kind,
            prompt: &payload.prompt,
            points: payload.points,
            position: payload.position,
            options: payload
                .options
                .into_iter()
                .map(|option| repositories::questions::OptionSpec {
                    label: option.label,
                    is_correct: option.is_correct,
                })
                .collect(),
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question, options, true))))
}

async fn update_question(
    Path((quiz_id, question_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    reject_when_attempted(&state, &quiz_id).await?;

    let existing = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;
    if existing.quiz_id != quiz_id {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    if let Some(options) = payload.options.as_deref() {
        validate_question_shape(existing.kind, options)?;
    }

    let question = repositories::questions::update(
        state.db(),
        &question_id,
        repositories::questions::UpdateQuestion {
            prompt: payload.prompt,
            points: payload.points,
            position: payload.position,
            options: payload.options.map(|options| {
                options
                    .into_iter()
                    .map(|option| repositories::questions::OptionSpec {
                        label: option.label,
                        is_correct: option.is_correct,
                    })
                    .collect()
            }),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update question"))?;

    let options = repositories::questions::list_options_for_question(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list options"))?;

    Ok(Json(QuestionResponse::from_db(question, options, true)))
}

async fn delete_question(
    Path((quiz_id, question_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let quiz = fetch_quiz(&state, &quiz_id).await?;
    require_manage(&state, &user, &quiz.offering_id).await?;
    reject_when_attempted(&state, &quiz_id).await?;

    let existing = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?;
    if existing.map(|question| question.quiz_id) != Some(quiz_id) {
        return Err(ApiError::NotFound("Question not found".to_string()));
    }

    repositories::questions::delete(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    Ok(StatusCode::NO_CONTENT)
}

fn validate_question_shape(kind: QuestionKind, options: &[OptionCreate]) -> Result<(), ApiError> {
    match kind {
        QuestionKind::MultipleChoice => {
            if options.len() < 2 {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need at least two options".to_string(),
                ));
            }
            let correct = options.iter().filter(|option| option.is_correct).count();
            if correct != 1 {
                return Err(ApiError::BadRequest(
                    "multiple_choice questions need exactly one correct option".to_string(),
                ));
            }
        }
        QuestionKind::TrueFalse => {
            if options.len() != 2 {
                return Err(ApiError::BadRequest(
                    "true_false questions need exactly two options".to_string(),
                ));
            }
            let correct = options.iter().filter(|option| option.is_correct).count();
            if correct != 1 {
                return Err(ApiError::BadRequest(
                    "true_false questions need exactly one correct option".to_string(),
                ));
            }
        }
        QuestionKind::ShortAnswer => {
            if !options.is_empty() {
                return Err(ApiError::BadRequest(
                    "short_answer questions cannot have options".to_string(),
                ));
            }
        }
    }
    Ok(())
}

/// Question edits would silently change what already-started attempts
/// were answering, so they are refused outright.
async fn reject_when_attempted(state: &AppState, quiz_id: &str) -> Result<(), ApiError> {
    let has_attempts = repositories::attempts::exists_for_quiz(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check attempts"))?;
    if has_attempts {
        return Err(ApiError::Conflict(
            "Questions cannot change after attempts exist".to_string(),
        ));
    }
    Ok(())
}

pub(super) async fn fetch_quiz(state: &AppState, quiz_id: &str) -> Result<Quiz, ApiError> {
    repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))
}

/// Draft quizzes read as not found for students.
pub(super) async fn fetch_quiz_for_read(
    state: &AppState,
    user: &crate::db::models::User,
    quiz_id: &str,
) -> Result<(Quiz, OfferingRelation), ApiError> {
    let quiz = fetch_quiz(state, quiz_id).await?;
    let relation = require_member(state, user, &quiz.offering_id).await?;

    if quiz.status == QuizStatus::Draft && !access_policy::can_manage_assessments(relation) {
        return Err(ApiError::NotFound("Quiz not found".to_string()));
    }

    Ok((quiz, relation))
}

#[cfg(test)]
mod tests;
