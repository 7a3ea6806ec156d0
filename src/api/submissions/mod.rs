mod helpers;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::assignments::{fetch_assignment, fetch_assignment_for_read};
use crate::api::errors::ApiError;
use crate::api::guards::{require_manage, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::AssignmentSubmission;
use crate::db::types::{NotificationKind, SubmissionStatus};
use crate::repositories;
use crate::schemas::submission::{
    SubmissionGradeRequest, SubmissionListResponse, SubmissionResponse,
};
use crate::services::access_policy::{self, OfferingRelation};
use crate::services::attempt_windows;
use crate::services::notifications;

/// Routes mounted under `/assignments/:assignment_id/submissions`.
pub(crate) fn collection_router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit).get(list_submissions))
        .route("/me", get(get_own_submission))
}

/// Routes mounted under `/submissions`.
pub(crate) fn item_router() -> Router<AppState> {
    Router::new()
        .route("/:submission_id", get(get_submission).delete(delete_submission))
        .route("/:submission_id/grade", post(grade_submission))
}

/// Student submit. A re-submit before the deadline replaces the previous
/// work; the one-row-per-student invariant lives in the database.
async fn submit(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<SubmissionResponse>), ApiError> {
    let (assignment, relation) =
        fetch_assignment_for_read(&state, &user, &assignment_id).await?;
    if !access_policy::can_participate(relation) {
        return Err(ApiError::Forbidden("Active enrollment in this offering required"));
    }

    let now = primitive_now_utc();
    if attempt_windows::is_past(now, assignment.due_date) {
        return Err(ApiError::DeadlineExceeded(
            "Submission deadline has passed".to_string(),
        ));
    }

    let upload = helpers::read_submission_upload(&state, multipart).await?;

    let mut stored_key: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut file_size: Option<i64> = None;
    let mut file_sha256: Option<String> = None;

    if let Some(file) = upload.file {
        let storage = state.storage().ok_or_else(|| {
            ApiError::BadRequest("File uploads are disabled on this deployment".to_string())
        })?;

        let key = format!(
            "submissions/{}/{}/{}_{}",
            assignment_id,
            user.id,
            Uuid::new_v4(),
            helpers::sanitized_filename(&file.filename)
        );
        let (size, hash) = storage
            .upload_bytes(&key, &file.content_type, file.bytes)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to upload file"))?;

        stored_key = Some(key);
        file_name = Some(file.filename);
        content_type = Some(file.content_type);
        file_size = Some(size);
        file_sha256 = Some(hash);
    }

    let result = repositories::submissions::upsert_final(
        state.db(),
        repositories::submissions::SubmitParams {
            assignment_id: &assignment_id,
            student_id: &user.id,
            file_key: stored_key.as_deref(),
            file_name: file_name.as_deref(),
            content_type: content_type.as_deref(),
            file_size,
            file_sha256: file_sha256.as_deref(),
            text_content: upload.text_content.as_deref(),
            submitted_at: now,
        },
    )
    .await;

    let (submission, previous_file_key) = match result {
        Ok(Some(value)) => value,
        Ok(None) => {
            // Graded work is frozen; drop the object that went up for nothing.
            if let Some(key) = stored_key.as_deref() {
                helpers::gc_object(&state, key).await;
            }
            return Err(ApiError::Conflict(
                "Submission has already been graded".to_string(),
            ));
        }
        Err(err) => {
            // The upload committed but the row did not; drop the object.
            if let Some(key) = stored_key.as_deref() {
                helpers::gc_object(&state, key).await;
            }
            return Err(ApiError::internal(err, "Failed to record submission"));
        }
    };

    if let Some(old_key) = previous_file_key {
        if stored_key.as_deref() != Some(old_key.as_str()) {
            helpers::gc_object(&state, &old_key).await;
        }
    }

    Ok((StatusCode::CREATED, Json(SubmissionResponse::from_db(submission, None))))
}

async fn list_submissions(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionListResponse>, ApiError> {
    let assignment = fetch_assignment(&state, &assignment_id).await?;
    require_manage(&state, &user, &assignment.offering_id).await?;

    let submissions = repositories::submissions::list_for_assignment(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list submissions"))?;

    let total = submissions.len() as i64;
    Ok(Json(SubmissionListResponse {
        items: submissions
            .into_iter()
            .map(|submission| SubmissionResponse::from_db(submission, None))
            .collect(),
        total,
    }))
}

async fn get_own_submission(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let (_, relation) = fetch_assignment_for_read(&state, &user, &assignment_id).await?;
    if !access_policy::can_participate(relation) {
        return Err(ApiError::Forbidden("Active enrollment in this offering required"));
    }

    let submission = repositories::submissions::find_by_pair(state.db(), &assignment_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))?;

    let download_url = presign_download(&state, &submission).await;
    Ok(Json(SubmissionResponse::from_db(submission, download_url)))
}

async fn get_submission(
    Path(submission_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    let (submission, _assignment, _relation) =
        fetch_submission_for_access(&state, &user, &submission_id).await?;

    let download_url = presign_download(&state, &submission).await;
    Ok(Json(SubmissionResponse::from_db(submission, download_url)))
}

/// Staff grading. Regrading the same submission updates the grade record
/// in place rather than stacking a second one.
async fn grade_submission(
    Path(submission_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmissionGradeRequest>,
) -> Result<Json<SubmissionResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let submission = fetch_submission(&state, &submission_id).await?;
    let assignment = fetch_assignment(&state, &submission.assignment_id).await?;
    require_manage(&state, &user, &assignment.offering_id).await?;

    if let Some(score) = payload.numeric_score {
        if score < 0.0 || score > assignment.max_points {
            return Err(ApiError::BadRequest(format!(
                "numeric_score must be between 0 and {}",
                assignment.max_points
            )));
        }
    }

    let now = primitive_now_utc();
    let graded = repositories::submissions::set_grade(
        state.db(),
        &submission_id,
        repositories::submissions::GradeParams {
            grade_value: &payload.grade_value,
            feedback: payload.feedback.as_deref(),
            graded_by: &user.id,
            graded_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to grade submission"))?;

    repositories::grades::upsert(
        state.db(),
        repositories::grades::UpsertGrade {
            student_id: &graded.student_id,
            offering_id: &assignment.offering_id,
            assignment_id: Some(&assignment.id),
            quiz_id: None,
            grade_value: &payload.grade_value,
            numeric_score: payload.numeric_score,
            remarks: payload.feedback.as_deref(),
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
        &notifications::grade_posted_message(&assignment.title, &payload.grade_value),
    )
    .await;
    if payload.feedback.is_some() {
        notifications::notify(
            state.db(),
            &graded.student_id,
            NotificationKind::FeedbackAdded,
            &notifications::feedback_added_message(&assignment.title),
        )
        .await;
    }

    Ok(Json(SubmissionResponse::from_db(graded, None)))
}

/// Students may withdraw their own ungraded work until the deadline; staff
/// can remove a submission at any time.
async fn delete_submission(
    Path(submission_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (submission, assignment, relation) =
        fetch_submission_for_access(&state, &user, &submission_id).await?;

    if !access_policy::can_grade(relation) {
        if submission.status == SubmissionStatus::Graded {
            return Err(ApiError::Conflict(
                "Submission has already been graded".to_string(),
            ));
        }
        let now = primitive_now_utc();
        if attempt_windows::is_past(now, assignment.due_date) {
            return Err(ApiError::DeadlineExceeded(
                "Submission deadline has passed".to_string(),
            ));
        }
    }

    let file_key = repositories::submissions::delete(state.db(), &submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete submission"))?;

    if let Some(key) = file_key {
        helpers::gc_object(&state, &key).await;
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_submission(
    state: &AppState,
    submission_id: &str,
) -> Result<AssignmentSubmission, ApiError> {
    repositories::submissions::find_by_id(state.db(), submission_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch submission"))?
        .ok_or_else(|| ApiError::NotFound("Submission not found".to_string()))
}

/// Owner or staff of the owning offering.
async fn fetch_submission_for_access(
    state: &AppState,
    user: &crate::db::models::User,
    submission_id: &str,
) -> Result<(AssignmentSubmission, crate::db::models::Assignment, OfferingRelation), ApiError> {
    let submission = fetch_submission(state, submission_id).await?;
    let assignment = fetch_assignment(state, &submission.assignment_id).await?;
    let relation =
        crate::api::guards::offering_relation(state, user, &assignment.offering_id).await?;

    if submission.student_id != user.id && !access_policy::can_grade(relation) {
        return Err(ApiError::Forbidden("Access denied"));
    }

    Ok((submission, assignment, relation))
}

async fn presign_download(state: &AppState, submission: &AssignmentSubmission) -> Option<String> {
    let key = submission.file_key.as_deref()?;
    let storage = state.storage()?;
    let expires =
        std::time::Duration::from_secs(state.settings().storage().presigned_url_expire_minutes * 60);

    match storage.presign_get(key, expires).await {
        Ok(url) => Some(url),
        Err(err) => {
            tracing::warn!(error = %err, key, "failed to presign download url");
            None
        }
    }
}

#[cfg(test)]
mod tests;
