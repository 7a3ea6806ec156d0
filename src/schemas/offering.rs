use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{CourseOffering, Enrollment, StaffAssignment};
use crate::db::types::EnrollmentStatus;
use crate::schemas::deserialize_offset_datetime_flexible;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct OfferingCreate {
    #[serde(alias = "courseCode")]
    #[validate(length(min = 1, message = "course_code must not be empty"))]
    pub(crate) course_code: String,
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(alias = "sessionStart", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) session_start: OffsetDateTime,
    #[serde(alias = "sessionEnd", deserialize_with = "deserialize_offset_datetime_flexible")]
    pub(crate) session_end: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub(crate) struct OfferingResponse {
    pub(crate) id: String,
    pub(crate) course_code: String,
    pub(crate) title: String,
    pub(crate) session_start: String,
    pub(crate) session_end: String,
    pub(crate) created_at: String,
}

impl OfferingResponse {
    pub(crate) fn from_db(offering: CourseOffering) -> Self {
        Self {
            id: offering.id,
            course_code: offering.course_code,
            title: offering.title,
            session_start: format_primitive(offering.session_start),
            session_end: format_primitive(offering.session_end),
            created_at: format_primitive(offering.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OfferingListResponse {
    pub(crate) items: Vec<OfferingResponse>,
    pub(crate) total: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollRequest {
    #[serde(alias = "studentId")]
    pub(crate) student_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentStatusUpdate {
    pub(crate) status: EnrollmentStatus,
}

#[derive(Debug, Serialize)]
pub(crate) struct EnrollmentResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) offering_id: String,
    pub(crate) status: EnrollmentStatus,
    pub(crate) created_at: String,
}

impl EnrollmentResponse {
    pub(crate) fn from_db(enrollment: Enrollment) -> Self {
        Self {
            id: enrollment.id,
            student_id: enrollment.student_id,
            offering_id: enrollment.offering_id,
            status: enrollment.status,
            created_at: format_primitive(enrollment.created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StaffAssignRequest {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StaffAssignmentResponse {
    pub(crate) id: String,
    pub(crate) user_id: String,
    pub(crate) offering_id: String,
    pub(crate) created_at: String,
}

impl StaffAssignmentResponse {
    pub(crate) fn from_db(assignment: StaffAssignment) -> Self {
        Self {
            id: assignment.id,
            user_id: assignment.user_id,
            offering_id: assignment.offering_id,
            created_at: format_primitive(assignment.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterResponse {
    pub(crate) staff: Vec<StaffAssignmentResponse>,
    pub(crate) students: Vec<EnrollmentResponse>,
}
