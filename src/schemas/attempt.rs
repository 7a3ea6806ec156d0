use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{QuizAnswer, QuizAttempt};
use crate::db::types::AttemptStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerSubmit {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "selectedOptionId")]
    pub(crate) selected_option_id: Option<String>,
    #[serde(default)]
    #[serde(alias = "answerText")]
    pub(crate) answer_text: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ManualScore {
    #[serde(alias = "answerId")]
    #[validate(length(min = 1, message = "answer_id must not be empty"))]
    pub(crate) answer_id: String,
    #[serde(alias = "scoreAwarded")]
    #[validate(range(min = 0.0, message = "score_awarded must be non-negative"))]
    pub(crate) score_awarded: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AttemptGradeRequest {
    #[serde(default)]
    #[validate(nested)]
    pub(crate) scores: Vec<ManualScore>,
    #[serde(default)]
    pub(crate) remarks: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) status: AttemptStatus,
    pub(crate) started_at: String,
    pub(crate) submitted_at: Option<String>,
    pub(crate) deadline: String,
    pub(crate) total_score: Option<f64>,
}

impl AttemptResponse {
    pub(crate) fn from_db(attempt: QuizAttempt, deadline: time::PrimitiveDateTime) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            student_id: attempt.student_id,
            status: attempt.status,
            started_at: format_primitive(attempt.started_at),
            submitted_at: attempt.submitted_at.map(format_primitive),
            deadline: format_primitive(deadline),
            total_score: attempt.total_score,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) question_id: String,
    pub(crate) selected_option_id: Option<String>,
    pub(crate) answer_text: Option<String>,
    pub(crate) is_correct: Option<bool>,
    pub(crate) score_awarded: Option<f64>,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: QuizAnswer) -> Self {
        Self {
            id: answer.id,
            question_id: answer.question_id,
            selected_option_id: answer.selected_option_id,
            answer_text: answer.answer_text,
            is_correct: answer.is_correct,
            score_awarded: answer.score_awarded,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptDetailResponse {
    #[serde(flatten)]
    pub(crate) attempt: AttemptResponse,
    pub(crate) answers: Vec<AnswerResponse>,
}
