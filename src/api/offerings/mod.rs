use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_manage, require_member, CurrentAdmin, CurrentUser};
use crate::api::pagination::ListQuery;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::types::{EnrollmentStatus, UserRole};
use crate::repositories;
use crate::schemas::offering::{
    EnrollRequest, EnrollmentResponse, EnrollmentStatusUpdate, OfferingCreate, OfferingListResponse,
    OfferingResponse, RosterResponse, StaffAssignRequest, StaffAssignmentResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_offering).get(list_offerings))
        .route("/:offering_id", get(get_offering))
        .route("/:offering_id/staff", post(assign_staff))
        .route("/:offering_id/staff/:user_id", axum::routing::delete(remove_staff))
        .route("/:offering_id/enrollments", post(enroll_student))
        .route("/:offering_id/enrollments/:student_id", axum::routing::patch(update_enrollment))
        .route("/:offering_id/roster", get(get_roster))
}

async fn create_offering(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<OfferingCreate>,
) -> Result<(StatusCode, Json<OfferingResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    if payload.session_end <= payload.session_start {
        return Err(ApiError::BadRequest("session_end must be after session_start".to_string()));
    }

    let now = primitive_now_utc();
    let offering = repositories::offerings::create(
        state.db(),
        repositories::offerings::CreateOffering {
            id: &Uuid::new_v4().to_string(),
            course_code: &payload.course_code,
            title: &payload.title,
            session_start: to_primitive_utc(payload.session_start),
            session_end: to_primitive_utc(payload.session_end),
            created_by: &admin.id,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create offering"))?;

    Ok((StatusCode::CREATED, Json(OfferingResponse::from_db(offering))))
}

async fn list_offerings(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<OfferingListResponse>, ApiError> {
    let (skip, limit) = query.clamp();

    let offerings = repositories::offerings::list(state.db(), limit, skip)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list offerings"))?;
    let total = repositories::offerings::count(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count offerings"))?;

    Ok(Json(OfferingListResponse {
        items: offerings.into_iter().map(OfferingResponse::from_db).collect(),
        total,
    }))
}

async fn get_offering(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<OfferingResponse>, ApiError> {
    let offering = fetch_offering(&state, &offering_id).await?;
    require_member(&state, &user, &offering_id).await?;

    Ok(Json(OfferingResponse::from_db(offering)))
}

async fn assign_staff(
    Path(offering_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<StaffAssignRequest>,
) -> Result<(StatusCode, Json<StaffAssignmentResponse>), ApiError> {
    fetch_offering(&state, &offering_id).await?;

    let user = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load user"))?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !user.role.is_staff() {
        return Err(ApiError::BadRequest(
            "Only professors and associate teachers can be assigned as staff".to_string(),
        ));
    }

    let assignment =
        repositories::staff_assignments::upsert(state.db(), &user.id, &offering_id, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to assign staff"))?;

    Ok((StatusCode::CREATED, Json(StaffAssignmentResponse::from_db(assignment))))
}

async fn remove_staff(
    Path((offering_id, user_id)): Path<(String, String)>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let removed = repositories::staff_assignments::remove(state.db(), &user_id, &offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to remove staff assignment"))?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Staff assignment not found".to_string()))
    }
}

async fn enroll_student(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollmentResponse>), ApiError> {
    fetch_offering(&state, &offering_id).await?;
    require_manage(&state, &user, &offering_id).await?;

    let student = repositories::users::find_by_id(state.db(), &payload.student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    if student.role != UserRole::Student {
        return Err(ApiError::BadRequest("Only students can be enrolled".to_string()));
    }

    let enrollment = repositories::enrollments::upsert(
        state.db(),
        &student.id,
        &offering_id,
        EnrollmentStatus::Active,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to enroll student"))?;

    Ok((StatusCode::CREATED, Json(EnrollmentResponse::from_db(enrollment))))
}

async fn update_enrollment(
    Path((offering_id, student_id)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<EnrollmentStatusUpdate>,
) -> Result<Json<EnrollmentResponse>, ApiError> {
    require_manage(&state, &user, &offering_id).await?;

    let enrollment = repositories::enrollments::set_status(
        state.db(),
        &student_id,
        &offering_id,
        payload.status,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update enrollment"))?
    .ok_or_else(|| ApiError::NotFound("Enrollment not found".to_string()))?;

    Ok(Json(EnrollmentResponse::from_db(enrollment)))
}

async fn get_roster(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<RosterResponse>, ApiError> {
    fetch_offering(&state, &offering_id).await?;
    require_manage(&state, &user, &offering_id).await?;

    let staff = repositories::staff_assignments::list_for_offering(state.db(), &offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list staff"))?;
    let students = repositories::enrollments::list_for_offering(state.db(), &offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list enrollments"))?;

    Ok(Json(RosterResponse {
        staff: staff.into_iter().map(StaffAssignmentResponse::from_db).collect(),
        students: students.into_iter().map(EnrollmentResponse::from_db).collect(),
    }))
}

pub(super) async fn fetch_offering(
    state: &AppState,
    offering_id: &str,
) -> Result<crate::db::models::CourseOffering, ApiError> {
    repositories::offerings::find_by_id(state.db(), offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch offering"))?
        .ok_or_else(|| ApiError::NotFound("Offering not found".to_string()))
}

#[cfg(test)]
mod tests;
