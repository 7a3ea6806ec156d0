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
use crate::db::models::Assignment;
use crate::db::types::AssignmentStatus;
use crate::repositories;
use crate::schemas::assignment::{AssignmentCreate, AssignmentResponse, AssignmentUpdate};
use crate::services::access_policy::{self, OfferingRelation};

/// Routes mounted under `/offerings/:offering_id/assignments`.
pub(crate) fn collection_router() -> Router<AppState> {
    Router::new().route("/", post(create_assignment).get(list_assignments))
}

/// Routes mounted under `/assignments`.
pub(crate) fn item_router() -> Router<AppState> {
    Router::new()
        .route(
            "/:assignment_id",
            get(get_assignment).patch(update_assignment).delete(delete_assignment),
        )
        .route("/:assignment_id/publish", post(publish_assignment))
}

async fn create_assignment(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentCreate>,
) -> Result<(StatusCode, Json<AssignmentResponse>), ApiError> {
    let offering = fetch_offering(&state, &offering_id).await?;
    require_manage(&state, &user, &offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let now = primitive_now_utc();
    let due_date = to_primitive_utc(payload.due_date);
    if due_date <= now {
        return Err(ApiError::BadRequest("due_date must be in the future".to_string()));
    }
    if due_date < offering.session_start {
        return Err(ApiError::BadRequest(
            "due_date falls before the academic session starts".to_string(),
        ));
    }

    let assignment = repositories::assignments::create(
        state.db(),
        repositories::assignments::CreateAssignment {
            id: &Uuid::new_v4().to_string(),
            offering_id: &offering_id,
            title: &payload.title,
            description: payload.description.as_deref(),
            due_date,
            max_points: payload.max_points,
            status: AssignmentStatus::Draft,
            created_by: &user.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create assignment"))?;

    Ok((StatusCode::CREATED, Json(AssignmentResponse::from_db(assignment))))
}

async fn list_assignments(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AssignmentResponse>>, ApiError> {
    fetch_offering(&state, &offering_id).await?;
    let relation = require_member(&state, &user, &offering_id).await?;

    let only_published = !access_policy::can_manage_assessments(relation);
    let assignments =
        repositories::assignments::list_for_offering(state.db(), &offering_id, only_published)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list assignments"))?;

    Ok(Json(assignments.into_iter().map(AssignmentResponse::from_db).collect()))
}

async fn get_assignment(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let (assignment, _relation) = fetch_assignment_for_read(&state, &user, &assignment_id).await?;
    Ok(Json(AssignmentResponse::from_db(assignment)))
}

async fn update_assignment(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AssignmentUpdate>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = fetch_assignment(&state, &assignment_id).await?;
    require_manage(&state, &user, &assignment.offering_id).await?;

    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let due_date = match payload.due_date {
        Some(value) => {
            let has_submissions =
                repositories::submissions::exists_for_assignment(state.db(), &assignment_id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to check submissions"))?;
            if has_submissions {
                return Err(ApiError::Conflict(
                    "due_date cannot change after submissions exist".to_string(),
                ));
            }
            Some(to_primitive_utc(value))
        }
        None => None,
    };

    let updated = repositories::assignments::update(
        state.db(),
        &assignment_id,
        repositories::assignments::UpdateAssignment {
            title: payload.title,
            description: payload.description,
            due_date,
            max_points: payload.max_points,
            status: None,
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update assignment"))?;

    Ok(Json(AssignmentResponse::from_db(updated)))
}

async fn publish_assignment(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AssignmentResponse>, ApiError> {
    let assignment = fetch_assignment(&state, &assignment_id).await?;
    require_manage(&state, &user, &assignment.offering_id).await?;

    if assignment.status == AssignmentStatus::Published {
        return Ok(Json(AssignmentResponse::from_db(assignment)));
    }

    let updated = repositories::assignments::update(
        state.db(),
        &assignment_id,
        repositories::assignments::UpdateAssignment {
            title: None,
            description: None,
            due_date: None,
            max_points: None,
            status: Some(AssignmentStatus::Published),
            updated_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to publish assignment"))?;

    Ok(Json(AssignmentResponse::from_db(updated)))
}

async fn delete_assignment(
    Path(assignment_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let assignment = fetch_assignment(&state, &assignment_id).await?;
    require_manage(&state, &user, &assignment.offering_id).await?;

    let has_submissions =
        repositories::submissions::exists_for_assignment(state.db(), &assignment_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to check submissions"))?;
    if has_submissions {
        return Err(ApiError::Conflict(
            "Assignment with submissions cannot be deleted".to_string(),
        ));
    }

    repositories::assignments::delete(state.db(), &assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete assignment"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn fetch_assignment(
    state: &AppState,
    assignment_id: &str,
) -> Result<Assignment, ApiError> {
    repositories::assignments::find_by_id(state.db(), assignment_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch assignment"))?
        .ok_or_else(|| ApiError::NotFound("Assignment not found".to_string()))
}

/// Loads the assignment and checks read access. Students never learn that
/// a draft exists; it reads as not found.
pub(super) async fn fetch_assignment_for_read(
    state: &AppState,
    user: &crate::db::models::User,
    assignment_id: &str,
) -> Result<(Assignment, OfferingRelation), ApiError> {
    let assignment = fetch_assignment(state, assignment_id).await?;
    let relation = require_member(state, user, &assignment.offering_id).await?;

    if assignment.status == AssignmentStatus::Draft
        && !access_policy::can_manage_assessments(relation)
    {
        return Err(ApiError::NotFound("Assignment not found".to_string()));
    }

    Ok((assignment, relation))
}

#[cfg(test)]
mod tests;
