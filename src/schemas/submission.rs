use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::AssignmentSubmission;
use crate::db::types::SubmissionStatus;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmissionGradeRequest {
    #[serde(alias = "gradeValue")]
    #[validate(length(min = 1, message = "grade_value must not be empty"))]
    pub(crate) grade_value: String,
    #[serde(default)]
    pub(crate) feedback: Option<String>,
    #[serde(default)]
    #[serde(alias = "numericScore")]
    pub(crate) numeric_score: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionResponse {
    pub(crate) id: String,
    pub(crate) assignment_id: String,
    pub(crate) student_id: String,
    pub(crate) file_name: Option<String>,
    pub(crate) content_type: Option<String>,
    pub(crate) file_size: Option<i64>,
    pub(crate) file_sha256: Option<String>,
    pub(crate) text_content: Option<String>,
    pub(crate) status: SubmissionStatus,
    pub(crate) grade_value: Option<String>,
    pub(crate) feedback: Option<String>,
    pub(crate) graded_by: Option<String>,
    pub(crate) graded_at: Option<String>,
    pub(crate) submitted_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) download_url: Option<String>,
}

impl SubmissionResponse {
    pub(crate) fn from_db(submission: AssignmentSubmission, download_url: Option<String>) -> Self {
        Self {
            id: submission.id,
            assignment_id: submission.assignment_id,
            student_id: submission.student_id,
            file_name: submission.file_name,
            content_type: submission.content_type,
            file_size: submission.file_size,
            file_sha256: submission.file_sha256,
            text_content: submission.text_content,
            status: submission.status,
            grade_value: submission.grade_value,
            feedback: submission.feedback,
            graded_by: submission.graded_by,
            graded_at: submission.graded_at.map(format_primitive),
            submitted_at: format_primitive(submission.submitted_at),
            download_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmissionListResponse {
    pub(crate) items: Vec<SubmissionResponse>,
    pub(crate) total: i64,
}
