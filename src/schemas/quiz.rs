use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Question, QuestionOption, Quiz};
use crate::db::types::{QuestionKind, QuizStatus};
use crate::schemas::{
    deserialize_offset_datetime_flexible, deserialize_option_offset_datetime_flexible,
};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[serde(alias = "assignmentId")]
    pub(crate) assignment_id: Option<String>,
    #[serde(alias = "opensAt", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) opens_at: OffsetDateTime,
    #[serde(alias = "closesAt", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) closes_at: OffsetDateTime,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "opensAt",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) opens_at: Option<OffsetDateTime>,
    #[serde(
        default,
        alias = "closesAt",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) closes_at: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "durationMinutes")]
    #[validate(range(min = 1, message = "duration_minutes must be positive"))]
    pub(crate) duration_minutes: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OptionCreate {
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub(crate) label: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    pub(crate) kind: QuestionKind,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: String,
    #[validate(range(exclusive_min = 0.0, message = "points must be positive"))]
    pub(crate) points: f64,
    #[serde(default)]
    pub(crate) position: i32,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Vec<OptionCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub(crate) prompt: Option<String>,
    #[serde(default)]
    #[validate(range(exclusive_min = 0.0, message = "points must be positive"))]
    pub(crate) points: Option<f64>,
    #[serde(default)]
    pub(crate) position: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) options: Option<Vec<OptionCreate>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) offering_id: String,
    pub(crate) assignment_id: Option<String>,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) opens_at: String,
    pub(crate) closes_at: String,
    pub(crate) duration_minutes: Option<i32>,
    pub(crate) status: QuizStatus,
    pub(crate) published_at: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz) -> Self {
        Self {
            id: quiz.id,
            offering_id: quiz.offering_id,
            assignment_id: quiz.assignment_id,
            title: quiz.title,
            description: quiz.description,
            opens_at: format_primitive(quiz.opens_at),
            closes_at: format_primitive(quiz.closes_at),
            duration_minutes: quiz.duration_minutes,
            status: quiz.status,
            published_at: quiz.published_at.map(format_primitive),
            created_at: format_primitive(quiz.created_at),
            updated_at: format_primitive(quiz.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OptionResponse {
    pub(crate) id: String,
    pub(crate) label: String,
    pub(crate) position: i32,
    /// Only present for staff; answer keys never reach students.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) is_correct: Option<bool>,
}

impl OptionResponse {
    pub(crate) fn from_db(option: QuestionOption, include_key: bool) -> Self {
        Self {
            id: option.id,
            label: option.label,
            position: option.position,
            is_correct: include_key.then_some(option.is_correct),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) kind: QuestionKind,
    pub(crate) prompt: String,
    pub(crate) points: f64,
    pub(crate) position: i32,
    pub(crate) options: Vec<OptionResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(
        question: Question,
        options: Vec<QuestionOption>,
        include_key: bool,
    ) -> Self {
        Self {
            id: question.id,
            quiz_id: question.quiz_id,
            kind: question.kind,
            prompt: question.prompt,
            points: question.points,
            position: question.position,
            options: options
                .into_iter()
                .map(|option| OptionResponse::from_db(option, include_key))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizDetailResponse {
    #[serde(flatten)]
    pub(crate) quiz: QuizResponse,
    pub(crate) questions: Vec<QuestionResponse>,
    pub(crate) total_points: f64,
}
