//! Project browsing and signup routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::{CapacitySnapshot, ContactInfo, Registration};
use domain::services::{ProjectSummary, SignupRequest};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AuthUser;

/// Signup request body. All contact fields are optional for authenticated
/// volunteers; anonymous signups must carry an email.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RegisterRequest {
    #[serde(default)]
    pub guest_count: i32,

    #[serde(default)]
    pub lead_interest: bool,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    pub email: Option<String>,

    pub phone: Option<String>,

    #[serde(default)]
    pub text_permission: bool,
}

impl From<RegisterRequest> for SignupRequest {
    fn from(req: RegisterRequest) -> Self {
        SignupRequest {
            guest_count: req.guest_count,
            lead_interest: req.lead_interest,
            contact: ContactInfo {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                phone: req.phone,
                text_permission: req.text_permission,
            },
        }
    }
}

/// Query parameters for identity-by-email operations.
#[derive(Debug, Deserialize)]
pub struct IdentityParams {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// List all projects with their current occupancy.
///
/// GET /api/v1/projects
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectSummary>>, ApiError> {
    let summaries = state.engine.list_projects().await?;
    Ok(Json(summaries))
}

/// Get a single project with its current occupancy.
///
/// GET /api/v1/projects/:id
pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ProjectSummary>, ApiError> {
    let summary = state.engine.project_detail(project_id).await?;
    Ok(Json(summary))
}

/// Get the capacity snapshot for a project.
///
/// GET /api/v1/projects/:id/capacity
pub async fn get_capacity(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<CapacitySnapshot>, ApiError> {
    let snapshot = state.engine.capacity_snapshot(project_id).await?;
    Ok(Json(snapshot))
}

/// Register the caller for a project.
///
/// POST /api/v1/projects/:id/register
///
/// Anonymous signups carry the volunteer's email in the body; authenticated
/// signups are keyed by the token subject and the email is contact info.
pub async fn register_for_project(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(project_id): Path<i64>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Registration>), ApiError> {
    let registration = state
        .engine
        .register(&auth, project_id, request.into())
        .await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Cancel the caller's registration for a project.
///
/// POST /api/v1/projects/:id/cancel?email=...
///
/// Retries of an already-cancelled registration succeed as no-ops.
pub async fn cancel_registration(
    State(state): State<AppState>,
    AuthUser(auth): AuthUser,
    Path(project_id): Path<i64>,
    Query(params): Query<IdentityParams>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .engine
        .cancel(&auth, project_id, params.email.as_deref())
        .await?;

    Ok(Json(MessageResponse {
        message: "Registration cancelled successfully".to_string(),
    }))
}
