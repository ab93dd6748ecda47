//! Store abstractions.
//!
//! The engine talks to persistence through these traits so the same
//! admission logic runs against PostgreSQL in production and the in-memory
//! store in tests and development. Implementations must uphold two
//! guarantees the engine depends on:
//!
//! - `RegistrationStore::create` enforces at most one `registered` row per
//!   (project, identity) pair at the storage level and reports a violation
//!   as [`StoreError::Duplicate`].
//! - `cancel` and `update_guest_count` are guarded compare-and-swap
//!   operations: they apply only when the row is still in the expected
//!   state and report whether they did, so concurrent mutators can never
//!   double-release or double-apply seats.

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{
    Identity, NewProject, NewRegistration, Project, ProjectStatus, ProjectUpdate, Registration,
};

/// Durable storage for projects.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create(&self, new: NewProject) -> Result<Project, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Project>, StoreError>;

    async fn list(&self) -> Result<Vec<Project>, StoreError>;

    /// Updates descriptive fields; returns the updated project or
    /// [`StoreError::NotFound`].
    async fn update(&self, id: i64, update: ProjectUpdate) -> Result<Project, StoreError>;

    /// Removes the project row. Returns false when it did not exist.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, StoreError>;

    async fn set_status(&self, id: i64, status: ProjectStatus) -> Result<bool, StoreError>;

    async fn set_max_capacity(&self, id: i64, max_capacity: i32) -> Result<bool, StoreError>;
}

/// Durable storage for registrations.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Persists a new registration in `registered` state.
    ///
    /// Fails with [`StoreError::Duplicate`] when an active registration for
    /// the same (project, identity) already exists.
    async fn create(&self, new: NewRegistration) -> Result<Registration, StoreError>;

    async fn find(&self, id: i64) -> Result<Option<Registration>, StoreError>;

    /// The active (`registered`) row for this (project, identity), if any.
    async fn find_active(
        &self,
        project_id: i64,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError>;

    /// Any active row for this identity across all projects. Backs the
    /// global one-project-per-identity policy.
    async fn find_active_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError>;

    /// The most recent row for this (project, identity) regardless of
    /// status. Backs idempotent cancellation.
    async fn find_latest(
        &self,
        project_id: i64,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError>;

    /// Marks the row cancelled if it is still `registered`.
    ///
    /// Returns the row as of the transition when this call performed it, so
    /// the caller releases exactly the seats the row held at that moment;
    /// `None` when the row was already off the active state.
    async fn cancel(&self, id: i64) -> Result<Option<Registration>, StoreError>;

    /// Sets the guest count if the row is still `registered` and currently
    /// holds `expected` guests. Returns true when this call applied it.
    async fn update_guest_count(
        &self,
        id: i64,
        expected: i32,
        new_count: i32,
    ) -> Result<bool, StoreError>;

    /// Hard-deletes the row, returning it when it existed.
    async fn delete(&self, id: i64) -> Result<Option<Registration>, StoreError>;

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Registration>, StoreError>;

    async fn list_by_identity(&self, identity: &Identity)
        -> Result<Vec<Registration>, StoreError>;

    /// Recounts occupied seats from `registered` rows:
    /// `Σ (1 + guest_count)`. The ledger's reconciliation source of truth.
    async fn occupied_seats(&self, project_id: i64) -> Result<i64, StoreError>;

    /// True when the project has at least one active registration.
    async fn has_active_for_project(&self, project_id: i64) -> Result<bool, StoreError>;
}
