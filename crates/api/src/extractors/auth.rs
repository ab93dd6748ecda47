//! Bearer-token authentication extractors.
//!
//! Signup and cancellation are open to anonymous volunteers, so [`AuthUser`]
//! never rejects a request for lacking a token; it only rejects tokens that
//! are present but invalid. [`AdminUser`] requires a valid token carrying
//! the configured admin permission.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};
use domain::models::AuthContext;
use shared::jwt::Claims;

use crate::app::AppState;
use crate::error::ApiError;

/// The caller's authentication context: a verified subject for logged-in
/// volunteers, anonymous otherwise.
#[derive(Debug, Clone)]
pub struct AuthUser(pub AuthContext);

/// A verified admin caller.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, ApiError> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| ApiError::Unauthorized("Malformed Authorization header".to_string()))?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| ApiError::Unauthorized("Malformed Authorization header".to_string()))
}

fn verify(state: &AppState, token: &str) -> Result<Claims, ApiError> {
    state.verifier.verify(token).map_err(|e| {
        tracing::debug!("Token verification failed: {}", e);
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            None => Ok(AuthUser(AuthContext::anonymous())),
            Some(token) => {
                let claims = verify(state, token)?;
                Ok(AuthUser(AuthContext::authenticated(claims.sub)))
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;
        let claims = verify(state, token)?;

        if !claims.has_permission(&state.config.auth.admin_permission) {
            tracing::debug!(subject = %claims.sub, "Admin permission missing");
            return Err(ApiError::Forbidden(
                "Admin permission required".to_string(),
            ));
        }

        Ok(AdminUser {
            subject: claims.sub,
        })
    }
}
