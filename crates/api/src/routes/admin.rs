//! Admin override routes.
//!
//! All handlers require a bearer token carrying the configured admin
//! permission. Capacity-affecting edits go through the admin override
//! service so the ledger stays consistent with the store.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::{
    CapacitySnapshot, NewProject, Project, ProjectStatus, ProjectUpdate, Registration,
};
use serde::Deserialize;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;
use crate::routes::projects::MessageResponse;
use crate::routes::registrations::GuestCountUpdate;

/// Create a project.
///
/// POST /api/v1/admin/projects
pub async fn create_project(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(new): Json<NewProject>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.admin.create_project(new).await?;
    info!(project_id = project.id, admin = %admin.subject, "Project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// Update a project's descriptive fields.
///
/// PUT /api/v1/admin/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(project_id): Path<i64>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Json<Project>, ApiError> {
    let project = state.admin.update_project(project_id, update).await?;
    info!(project_id, admin = %admin.subject, "Project updated");
    Ok(Json(project))
}

/// Delete a project. Rejected while active registrations exist.
///
/// DELETE /api/v1/admin/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(project_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.admin.delete_project(project_id).await?;
    info!(project_id, admin = %admin.subject, "Project deleted");
    Ok(Json(MessageResponse {
        message: "Project deleted successfully".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ActiveToggle {
    pub active: bool,
}

/// Toggle a project's visibility.
///
/// PATCH /api/v1/admin/projects/:id/active
pub async fn toggle_project_active(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(project_id): Path<i64>,
    Json(toggle): Json<ActiveToggle>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .admin
        .toggle_project_active(project_id, toggle.active)
        .await?;
    info!(project_id, active = toggle.active, admin = %admin.subject, "Project active toggled");
    Ok(Json(project))
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: ProjectStatus,
}

/// Open or close a project for registration.
///
/// PATCH /api/v1/admin/projects/:id/status
pub async fn set_project_status(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(project_id): Path<i64>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Project>, ApiError> {
    let project = state
        .admin
        .set_project_status(project_id, update.status)
        .await?;
    info!(project_id, status = %update.status, admin = %admin.subject, "Project status changed");
    Ok(Json(project))
}

#[derive(Debug, Deserialize)]
pub struct CapacityUpdate {
    pub max_capacity: i32,
}

/// Change a project's seat ceiling. Reductions below current occupancy are
/// accepted and block new reservations until seats drain.
///
/// PATCH /api/v1/admin/projects/:id/capacity
pub async fn set_project_capacity(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(project_id): Path<i64>,
    Json(update): Json<CapacityUpdate>,
) -> Result<Json<CapacitySnapshot>, ApiError> {
    let snapshot = state
        .admin
        .set_capacity(project_id, update.max_capacity)
        .await?;
    info!(project_id, max_capacity = update.max_capacity, admin = %admin.subject, "Project capacity changed");
    Ok(Json(snapshot))
}

/// The volunteer roster for a project.
///
/// GET /api/v1/admin/projects/:id/registrations
pub async fn list_registrations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<Registration>>, ApiError> {
    let registrations = state.admin.list_registrations(project_id).await?;
    Ok(Json(registrations))
}

/// Force-set a registration's guest count, bypassing the project-open
/// check (capacity is still enforced).
///
/// PATCH /api/v1/admin/registrations/:id
pub async fn force_set_guest_count(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(registration_id): Path<i64>,
    Json(update): Json<GuestCountUpdate>,
) -> Result<Json<Registration>, ApiError> {
    let registration = state
        .admin
        .force_set_guest_count(registration_id, update.guest_count)
        .await?;
    info!(registration_id, guest_count = update.guest_count, admin = %admin.subject, "Registration guest count forced");
    Ok(Json(registration))
}

/// Permanently delete a registration (distinct from cancel: no audit row
/// is retained). The UI confirms before calling this.
///
/// DELETE /api/v1/admin/registrations/:id
pub async fn delete_registration(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(registration_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.admin.delete_registration(registration_id).await?;
    info!(registration_id, admin = %admin.subject, "Registration deleted");
    Ok(Json(MessageResponse {
        message: "Registration deleted successfully".to_string(),
    }))
}

/// Recompute a project's occupied seats from the registration store and
/// overwrite the ledger's maintained count.
///
/// POST /api/v1/admin/projects/:id/reconcile
pub async fn reconcile_project(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(project_id): Path<i64>,
) -> Result<Json<CapacitySnapshot>, ApiError> {
    let snapshot = state.admin.reconcile(project_id).await?;
    info!(project_id, occupied = snapshot.occupied, admin = %admin.subject, "Ledger reconciled");
    Ok(Json(snapshot))
}
