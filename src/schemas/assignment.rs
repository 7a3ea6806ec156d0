use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Assignment;
use crate::db::types::AssignmentStatus;
use crate::schemas::{
    deserialize_offset_datetime_flexible, deserialize_option_offset_datetime_flexible,
};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(alias = "dueDate", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) due_date: OffsetDateTime,
    #[serde(alias = "maxPoints")]
    #[validate(range(exclusive_min = 0.0, message = "max_points must be positive"))]
    pub(crate) max_points: f64,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AssignmentUpdate {
    #[serde(default)]
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(
        default,
        alias = "dueDate",
        deserialize_with = "deserialize_option_offset_datetime_flexible"
    )]
    pub(crate) due_date: Option<OffsetDateTime>,
    #[serde(default)]
    #[serde(alias = "maxPoints")]
    #[validate(range(exclusive_min = 0.0, message = "max_points must be positive"))]
    pub(crate) max_points: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AssignmentResponse {
    pub(crate) id: String,
    pub(crate) offering_id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) due_date: String,
    pub(crate) max_points: f64,
    pub(crate) status: AssignmentStatus,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl AssignmentResponse {
    pub(crate) fn from_db(assignment: Assignment) -> Self {
        Self {
            id: assignment.id,
            offering_id: assignment.offering_id,
            title: assignment.title,
            description: assignment.description,
            due_date: format_primitive(assignment.due_date),
            max_points: assignment.max_points,
            status: assignment.status,
            created_at: format_primitive(assignment.created_at),
            updated_at: format_primitive(assignment.updated_at),
        }
    }
}
