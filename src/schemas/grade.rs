use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::Grade;

#[derive(Debug, Serialize)]
pub(crate) struct GradeResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) offering_id: String,
    pub(crate) assignment_id: Option<String>,
    pub(crate) quiz_id: Option<String>,
    pub(crate) grade_value: String,
    pub(crate) numeric_score: Option<f64>,
    pub(crate) remarks: Option<String>,
    pub(crate) graded_by: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl GradeResponse {
    pub(crate) fn from_db(grade: Grade) -> Self {
        Self {
            id: grade.id,
            student_id: grade.student_id,
            offering_id: grade.offering_id,
            assignment_id: grade.assignment_id,
            quiz_id: grade.quiz_id,
            grade_value: grade.grade_value,
            numeric_score: grade.numeric_score,
            remarks: grade.remarks,
            graded_by: grade.graded_by,
            created_at: format_primitive(grade.created_at),
            updated_at: format_primitive(grade.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GradeListResponse {
    pub(crate) items: Vec<GradeResponse>,
}
