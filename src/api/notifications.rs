use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::api::pagination::ListQuery;
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::notification::{NotificationListResponse, NotificationResponse};

/// Routes mounted under `/notifications`.
pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/:notification_id/read", post(mark_read))
}

async fn list_notifications(
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListQuery>,
    State(state): State<AppState>,
) -> Result<Json<NotificationListResponse>, ApiError> {
    let (skip, limit) = query.clamp();

    let notifications = repositories::notifications::list_for_user(state.db(), &user.id, limit, skip)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list notifications"))?;
    let unread = repositories::notifications::unread_count(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count notifications"))?;

    Ok(Json(NotificationListResponse {
        items: notifications.into_iter().map(NotificationResponse::from_db).collect(),
        unread,
    }))
}

async fn mark_read(
    Path(notification_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let updated = repositories::notifications::mark_read(state.db(), &notification_id, &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to mark notification read"))?;
    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
