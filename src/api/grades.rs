use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{require_manage, require_participant, CurrentUser};
use crate::api::offerings::fetch_offering;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::grade::{GradeListResponse, GradeResponse};

/// Routes mounted under `/offerings/:offering_id/grades`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_offering_grades))
        .route("/me", get(my_grades))
}

async fn list_offering_grades(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GradeListResponse>, ApiError> {
    fetch_offering(&state, &offering_id).await?;
    require_manage(&state, &user, &offering_id).await?;

    let grades = repositories::grades::list_for_offering(state.db(), &offering_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(GradeListResponse {
        items: grades.into_iter().map(GradeResponse::from_db).collect(),
    }))
}

async fn my_grades(
    Path(offering_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GradeListResponse>, ApiError> {
    fetch_offering(&state, &offering_id).await?;
    require_participant(&state, &user, &offering_id).await?;

    let grades =
        repositories::grades::list_for_student_in_offering(state.db(), &user.id, &offering_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list grades"))?;

    Ok(Json(GradeListResponse {
        items: grades.into_iter().map(GradeResponse::from_db).collect(),
    }))
}
