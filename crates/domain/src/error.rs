//! Domain error types.
//!
//! Engine outcomes split into three groups: business rejections (expected,
//! reported to the caller as structured results, never retried), contract
//! violations (rejected before any mutation), and transient infrastructure
//! failures (safe for the caller to retry).

use thiserror::Error;

/// Failures surfaced by a store implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record not found")]
    NotFound,

    /// The storage-level uniqueness constraint on active registrations
    /// rejected the write.
    #[error("Duplicate active registration")]
    Duplicate,

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Non-success outcomes of engine and admin operations.
#[derive(Debug, Error)]
pub enum EngineError {
    // Business rejections
    #[error("Project {0} not found")]
    ProjectNotFound(i64),

    #[error("Project {0} is not open for registration")]
    ProjectNotOpen(i64),

    #[error("Already registered for this project")]
    AlreadyRegistered { project_id: i64 },

    #[error("Already registered for another project")]
    AlreadyRegisteredElsewhere { project_id: i64 },

    #[error("Capacity not available for total number of volunteers requested")]
    CapacityExceeded { requested: i64, available: i64 },

    #[error("No active registration found for this project")]
    RegistrationNotFound,

    #[error("Project {0} still has active registrations")]
    ProjectHasRegistrations(i64),

    // Contract violations
    #[error("Identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Transient failures
    #[error("Resource was modified concurrently")]
    Conflict,

    #[error("Timed out waiting on {0}")]
    Timeout(&'static str),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// True when the caller may safely retry the operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::Conflict | EngineError::Timeout(_) | EngineError::StoreUnavailable(_)
        )
    }

    /// True for expected business outcomes (as opposed to failures).
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            EngineError::ProjectNotFound(_)
                | EngineError::ProjectNotOpen(_)
                | EngineError::AlreadyRegistered { .. }
                | EngineError::AlreadyRegisteredElsewhere { .. }
                | EngineError::CapacityExceeded { .. }
                | EngineError::RegistrationNotFound
                | EngineError::ProjectHasRegistrations(_)
        )
    }
}
