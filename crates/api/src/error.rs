use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::error::EngineError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate signup for the same project: confirmed as a no-op with
    /// 208 Already Reported, matching what the web client expects.
    #[error("Already registered: {0}")]
    AlreadyRegistered(String),

    /// Active registration exists on a different project (global policy).
    #[error("Registered elsewhere: {0}")]
    RegisteredElsewhere(String),

    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Project not open: {0}")]
    ProjectNotOpen(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    message: String,
    /// Present (true) only for transient failures the caller may retry.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, retryable, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", false, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", false, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", false, msg),
            ApiError::AlreadyRegistered(msg) => (
                StatusCode::ALREADY_REPORTED,
                "already_registered",
                false,
                msg,
            ),
            ApiError::RegisteredElsewhere(msg) => {
                (StatusCode::CONFLICT, "registered_elsewhere", false, msg)
            }
            ApiError::CapacityExceeded(msg) => {
                (StatusCode::CONFLICT, "capacity_exceeded", false, msg)
            }
            ApiError::ProjectNotOpen(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "project_not_open",
                false,
                msg,
            ),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", true, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", false, msg),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                true,
                "Too many requests. Please try again later.".into(),
            ),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "timeout", true, msg),
            ApiError::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                true,
                msg,
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    false,
                    "An internal error occurred".into(),
                )
            }
        };

        let body = ErrorBody {
            error: error_code.into(),
            message,
            retryable,
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ProjectNotFound(_) => ApiError::NotFound(err.to_string()),
            EngineError::ProjectNotOpen(_) => ApiError::ProjectNotOpen(err.to_string()),
            EngineError::AlreadyRegistered { .. } => {
                ApiError::AlreadyRegistered("Current user is already signed up for this project".into())
            }
            EngineError::AlreadyRegisteredElsewhere { .. } => {
                ApiError::RegisteredElsewhere("Current user is already signed up for a project".into())
            }
            EngineError::CapacityExceeded { .. } => ApiError::CapacityExceeded(err.to_string()),
            EngineError::RegistrationNotFound => ApiError::NotFound(err.to_string()),
            EngineError::ProjectHasRegistrations(_) => ApiError::Conflict(err.to_string()),
            EngineError::IdentityUnavailable(msg) => ApiError::Validation(msg),
            EngineError::Validation(msg) => ApiError::Validation(msg),
            EngineError::Conflict => ApiError::Conflict(err.to_string()),
            EngineError::Timeout(op) => {
                ApiError::Timeout(format!("Timed out waiting on {}", op))
            }
            EngineError::StoreUnavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                ApiError::ServiceUnavailable("Storage temporarily unavailable".into())
            }
            EngineError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    format!(
                        "{}: {}",
                        field,
                        e.message.clone().unwrap_or_else(|| "invalid".into())
                    )
                })
            })
            .collect();

        ApiError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_registered_is_208() {
        let error = ApiError::AlreadyRegistered("duplicate".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::ALREADY_REPORTED);
    }

    #[test]
    fn test_registered_elsewhere_is_409() {
        let error = ApiError::RegisteredElsewhere("other project".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_capacity_exceeded_is_409() {
        let error = ApiError::CapacityExceeded("full".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_project_not_open_is_422() {
        let error = ApiError::ProjectNotOpen("closed".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_not_found() {
        let error = ApiError::NotFound("missing".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_is_400() {
        let error = ApiError::Validation("bad input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_timeout_is_504() {
        let error = ApiError::Timeout("store".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_rate_limited_is_429() {
        let response = ApiError::RateLimited.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_engine_rejections_map_to_statuses() {
        let cases: Vec<(EngineError, StatusCode)> = vec![
            (EngineError::ProjectNotFound(1), StatusCode::NOT_FOUND),
            (
                EngineError::ProjectNotOpen(1),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                EngineError::AlreadyRegistered { project_id: 1 },
                StatusCode::ALREADY_REPORTED,
            ),
            (
                EngineError::AlreadyRegisteredElsewhere { project_id: 2 },
                StatusCode::CONFLICT,
            ),
            (
                EngineError::CapacityExceeded {
                    requested: 2,
                    available: 1,
                },
                StatusCode::CONFLICT,
            ),
            (
                EngineError::RegistrationNotFound,
                StatusCode::NOT_FOUND,
            ),
            (
                EngineError::IdentityUnavailable("no email".into()),
                StatusCode::BAD_REQUEST,
            ),
            (EngineError::Conflict, StatusCode::CONFLICT),
            (
                EngineError::Timeout("find_project"),
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                EngineError::StoreUnavailable("down".into()),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (engine_error, expected) in cases {
            let api_error: ApiError = engine_error.into();
            assert_eq!(api_error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_transient_errors_marked_retryable() {
        let body = ErrorBody {
            error: "timeout".into(),
            message: "Timed out".into(),
            retryable: true,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"retryable\":true"));

        let body = ErrorBody {
            error: "not_found".into(),
            message: "missing".into(),
            retryable: false,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(!json.contains("retryable"));
    }
}
