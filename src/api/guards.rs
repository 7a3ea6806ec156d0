use async_trait::async_trait;
use axum::extract::{FromRequestParts, State};
use axum::http::{header, request::Parts};

use crate::api::errors::ApiError;
use crate::core::{security, state::AppState};
use crate::db::models::User;
use crate::db::types::UserRole;
use crate::repositories;
use crate::services::access_policy::{self, OfferingRelation};

pub(crate) struct CurrentUser(pub(crate) User);
pub(crate) struct CurrentAdmin(pub(crate) User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state) = State::<AppState>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to access application state"))?;

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized("Invalid authentication credentials"))?;

        let claims = security::verify_token(token, app_state.settings())
            .map_err(|_| ApiError::Unauthorized("Invalid authentication credentials"))?;

        let user = repositories::users::find_by_id(app_state.db(), &claims.sub)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load user"))?;

        let Some(user) = user else {
            return Err(ApiError::Unauthorized("User not found"));
        };

        if !user.is_active {
            return Err(ApiError::Unauthorized("Invalid authentication credentials"));
        }

        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;

        if user.role == UserRole::Admin {
            Ok(CurrentAdmin(user))
        } else {
            Err(ApiError::Forbidden("Admin access required"))
        }
    }
}

/// Resolves what the caller is to the offering from the role column plus
/// the staff and enrollment rosters.
pub(crate) async fn offering_relation(
    state: &AppState,
    user: &User,
    offering_id: &str,
) -> Result<OfferingRelation, ApiError> {
    if user.role == UserRole::Admin {
        return Ok(OfferingRelation::Admin);
    }

    let is_staff = if user.role.is_staff() {
        repositories::staff_assignments::exists(state.db(), &user.id, offering_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch staff assignment"))?
    } else {
        false
    };

    let enrollment_status = if user.role == UserRole::Student {
        repositories::enrollments::find(state.db(), &user.id, offering_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch enrollment"))?
            .map(|enrollment| enrollment.status)
    } else {
        None
    };

    Ok(access_policy::resolve_relation(user.role, is_staff, enrollment_status))
}

/// Staff of the offering or admin; everyone else is rejected.
pub(crate) async fn require_manage(
    state: &AppState,
    user: &User,
    offering_id: &str,
) -> Result<OfferingRelation, ApiError> {
    let relation = offering_relation(state, user, offering_id).await?;
    if access_policy::can_manage_assessments(relation) {
        Ok(relation)
    } else {
        Err(ApiError::Forbidden("Staff access to this offering required"))
    }
}

/// Actively enrolled student of the offering.
pub(crate) async fn require_participant(
    state: &AppState,
    user: &User,
    offering_id: &str,
) -> Result<OfferingRelation, ApiError> {
    let relation = offering_relation(state, user, offering_id).await?;
    if access_policy::can_participate(relation) {
        Ok(relation)
    } else {
        Err(ApiError::Forbidden("Active enrollment in this offering required"))
    }
}

/// Anyone with a standing in the offering: staff, admin, or active student.
pub(crate) async fn require_member(
    state: &AppState,
    user: &User,
    offering_id: &str,
) -> Result<OfferingRelation, ApiError> {
    let relation = offering_relation(state, user, offering_id).await?;
    if access_policy::can_view_offering(relation) {
        Ok(relation)
    } else {
        Err(ApiError::Forbidden("No access to this offering"))
    }
}
