//! Identity provider configuration passthrough.
//!
//! The web client fetches its login-flow settings from here instead of
//! shipping them in its build.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

/// Login-flow configuration for the web client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfigResponse {
    pub domain: String,
    pub client_id: String,
    pub audience: String,
}

/// GET /api/v1/auth/config
pub async fn auth_config(State(state): State<AppState>) -> Json<AuthConfigResponse> {
    let auth = &state.config.auth;
    Json(AuthConfigResponse {
        domain: auth.domain.clone(),
        client_id: auth.client_id.clone(),
        audience: auth.audience.clone().unwrap_or_default(),
    })
}
