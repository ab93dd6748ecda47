//! PostgreSQL implementations of the domain store traits.

pub mod project;
pub mod registration;

pub use project::ProjectRepository;
pub use registration::RegistrationRepository;

use domain::error::StoreError;

/// Maps driver errors onto store errors. Unique-constraint violations
/// surface as [`StoreError::Duplicate`] so the engine can treat them as the
/// already-registered business outcome.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                StoreError::Duplicate
            } else {
                StoreError::Unavailable(format!("Database error: {}", db_err))
            }
        }
        other => StoreError::Unavailable(format!("Database error: {}", other)),
    }
}
