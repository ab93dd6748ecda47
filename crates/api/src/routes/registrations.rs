//! Volunteer-facing registration routes.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use domain::models::Registration;
use serde::Deserialize;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::routes::projects::IdentityParams;

/// The caller's current active registration.
///
/// GET /api/v1/registrations/me?email=...
pub async fn my_registration(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(params): Query<IdentityParams>,
) -> Result<Json<Registration>, ApiError> {
    let registration = state
        .engine
        .my_registration(&auth, params.email.as_deref())
        .await?
        .ok_or_else(|| ApiError::NotFound("No active registration".to_string()))?;

    Ok(Json(registration))
}

/// All of the caller's registrations, including cancelled ones.
///
/// GET /api/v1/registrations?email=...
pub async fn registration_history(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Query(params): Query<IdentityParams>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let history = state
        .engine
        .registration_history(&auth, params.email.as_deref())
        .await?;
    Ok(Json(history))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GuestCountUpdate {
    pub guest_count: i32,
}

/// Change the guest count on the caller's own registration.
///
/// PATCH /api/v1/registrations/:id/guest-count?email=...
pub async fn update_guest_count(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(registration_id): Path<i64>,
    Query(params): Query<IdentityParams>,
    Json(update): Json<GuestCountUpdate>,
) -> Result<Json<Registration>, ApiError> {
    let registration = state
        .engine
        .update_guest_count(
            &auth,
            params.email.as_deref(),
            registration_id,
            update.guest_count,
        )
        .await?;

    Ok(Json(registration))
}
