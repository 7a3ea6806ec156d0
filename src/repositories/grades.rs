use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Grade;

const COLUMNS: &str = "\
    id, student_id, offering_id, assignment_id, quiz_id, grade_value, numeric_score, \
    remarks, graded_by, created_at, updated_at";

pub(crate) struct UpsertGrade<'a> {
    pub(crate) student_id: &'a str,
    pub(crate) offering_id: &'a str,
    pub(crate) assignment_id: Option<&'a str>,
    pub(crate) quiz_id: Option<&'a str>,
    pub(crate) grade_value: &'a str,
    pub(crate) numeric_score: Option<f64>,
    pub(crate) remarks: Option<&'a str>,
    pub(crate) graded_by: Option<&'a str>,
    pub(crate) now: time::PrimitiveDateTime,
}

/// Writes the grade record for (student, assignment) or (student, quiz).
/// A regrade updates the existing row in place through the partial unique
/// indexes, so repeated grading never produces duplicate records.
pub(crate) async fn upsert(pool: &PgPool, params: UpsertGrade<'_>) -> Result<Grade, sqlx::Error> {
    let conflict_target = if params.assignment_id.is_some() {
        "(student_id, assignment_id) WHERE assignment_id IS NOT NULL"
    } else {
        "(student_id, quiz_id) WHERE quiz_id IS NOT NULL"
    };

    sqlx::query_as::<_, Grade>(&format!(
        "INSERT INTO grades (
            id, student_id, offering_id, assignment_id, quiz_id, grade_value,
            numeric_score, remarks, graded_by, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$10)
         ON CONFLICT {conflict_target} DO UPDATE SET
            grade_value = EXCLUDED.grade_value,
            numeric_score = EXCLUDED.numeric_score,
            remarks = EXCLUDED.remarks,
            graded_by = EXCLUDED.graded_by,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.student_id)
    .bind(params.offering_id)
    .bind(params.assignment_id)
    .bind(params.quiz_id)
    .bind(params.grade_value)
    .bind(params.numeric_score)
    .bind(params.remarks)
    .bind(params.graded_by)
    .bind(params.now)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_for_student_in_offering(
    pool: &PgPool,
    student_id: &str,
    offering_id: &str,
) -> Result<Vec<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "SELECT {COLUMNS} FROM grades
         WHERE student_id = $1 AND offering_id = $2
         ORDER BY created_at"
    ))
    .bind(student_id)
    .bind(offering_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_for_offering(
    pool: &PgPool,
    offering_id: &str,
) -> Result<Vec<Grade>, sqlx::Error> {
    sqlx::query_as::<_, Grade>(&format!(
        "SELECT {COLUMNS} FROM grades WHERE offering_id = $1 ORDER BY student_id, created_at"
    ))
    .bind(offering_id)
    .fetch_all(pool)
    .await
}
