use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::AssignmentSubmission;
use crate::db::types::SubmissionStatus;

const COLUMNS: &str = "\
    id, assignment_id, student_id, file_key, file_name, content_type, file_size, \
    file_sha256, text_content, status, grade_value, feedback, graded_by, graded_at, \
    submitted_at, created_at, updated_at";

pub(crate) struct SubmitParams<'a> {
    pub(crate) assignment_id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) file_key: Option<&'a str>,
    pub(crate) file_name: Option<&'a str>,
    pub(crate) content_type: Option<&'a str>,
    pub(crate) file_size: Option<i64>,
    pub(crate) file_sha256: Option<&'a str>,
    pub(crate) text_content: Option<&'a str>,
    pub(crate) submitted_at: time::PrimitiveDateTime,
}

/// Records a submission for (assignment, student). A second submit from the
/// same student replaces the previous row. Once the row is Graded it is
/// frozen; the replace path returns `None` and writes nothing. On success,
/// returns the stored row plus the file key the replaced row held, so the
/// caller can garbage-collect the orphaned object.
pub(crate) async fn upsert_final(
    pool: &PgPool,
    params: SubmitParams<'_>,
) -> Result<Option<(AssignmentSubmission, Option<String>)>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let existing = sqlx::query_as::<_, (SubmissionStatus, Option<String>)>(
        "SELECT status, file_key FROM assignment_submissions
         WHERE assignment_id = $1 AND student_id = $2
         FOR UPDATE",
    )
    .bind(params.assignment_id)
    .bind(params.student_id)
    .fetch_optional(&mut *tx)
    .await?;

    if let Some((SubmissionStatus::Graded, _)) = existing {
        tx.rollback().await?;
        return Ok(None);
    }
    let previous_file_key = existing.and_then(|(_, key)| key);

    let stored = sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "INSERT INTO assignment_submissions (
            id, assignment_id, student_id, file_key, file_name, content_type, file_size,
            file_sha256, text_content, status, submitted_at, created_at, updated_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$11,$11)
         ON CONFLICT (assignment_id, student_id) DO UPDATE SET
            file_key = EXCLUDED.file_key,
            file_name = EXCLUDED.file_name,
            content_type = EXCLUDED.content_type,
            file_size = EXCLUDED.file_size,
            file_sha256 = EXCLUDED.file_sha256,
            text_content = EXCLUDED.text_content,
            status = EXCLUDED.status,
            submitted_at = EXCLUDED.submitted_at,
            updated_at = EXCLUDED.updated_at
         RETURNING {COLUMNS}",
    ))
    .bind(Uuid::new_v4().to_string())
    .bind(params.assignment_id)
    .bind(params.student_id)
    .bind(params.file_key)
    .bind(params.file_name)
    .bind(params.content_type)
    .bind(params.file_size)
    .bind(params.file_sha256)
    .bind(params.text_content)
    .bind(SubmissionStatus::Final)
    .bind(params.submitted_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some((stored, previous_file_key)))
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions WHERE id = $1"
    ))
    .bind(submission_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_by_pair(
    pool: &PgPool,
    assignment_id: &str,
    student_id: &str,
) -> Result<Option<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions
         WHERE assignment_id = $1 AND student_id = $2"
    ))
    .bind(assignment_id)
    .bind(student_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_assignment(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<Vec<AssignmentSubmission>, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "SELECT {COLUMNS} FROM assignment_submissions
         WHERE assignment_id = $1
         ORDER BY submitted_at"
    ))
    .bind(assignment_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn exists_for_assignment(
    pool: &PgPool,
    assignment_id: &str,
) -> Result<bool, sqlx::Error> {
    let found = sqlx::query_scalar::<_, String>(
        "SELECT id FROM assignment_submissions WHERE assignment_id = $1 LIMIT 1",
    )
    .bind(assignment_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}

pub(crate) struct GradeParams<'a> {
    pub(crate) grade_value: &'a str,
    pub(crate) feedback: Option<&'a str>,
    pub(crate) graded_by: &'a str,
    pub(crate) graded_at: time::PrimitiveDateTime,
}

pub(crate) async fn set_grade(
    pool: &PgPool,
    submission_id: &str,
    params: GradeParams<'_>,
) -> Result<AssignmentSubmission, sqlx::Error> {
    sqlx::query_as::<_, AssignmentSubmission>(&format!(
        "UPDATE assignment_submissions SET
            grade_value = $1,
            feedback = $2,
            graded_by = $3,
            graded_at = $4,
            status = $5,
            updated_at = $4
         WHERE id = $6
         RETURNING {COLUMNS}",
    ))
    .bind(params.grade_value)
    .bind(params.feedback)
    .bind(params.graded_by)
    .bind(params.graded_at)
    .bind(SubmissionStatus::Graded)
    .bind(submission_id)
    .fetch_one(pool)
    .await
}

/// Deletes the row and hands back the stored file key for cleanup.
pub(crate) async fn delete(
    pool: &PgPool,
    submission_id: &str,
) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, Option<String>>(
        "DELETE FROM assignment_submissions WHERE id = $1 RETURNING file_key",
    )
    .bind(submission_id)
    .fetch_optional(pool)
    .await
    .map(Option::flatten)
}
