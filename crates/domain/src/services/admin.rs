//! Privileged mutation path.
//!
//! Admin operations bypass the normal admission checks (an admin may edit a
//! closed project) but go through the same ledger discipline, so capacity
//! accounting stays consistent no matter which path mutated a registration.

use std::sync::Arc;

use validator::Validate;

use crate::error::EngineError;
use crate::models::{
    CapacitySnapshot, NewProject, Project, ProjectStatus, ProjectUpdate, Registration,
};
use crate::services::engine::{infra, RegistrationEngine};

/// Administrative override operations for projects and registrations.
pub struct AdminOverrideService {
    engine: Arc<RegistrationEngine>,
}

impl AdminOverrideService {
    pub fn new(engine: Arc<RegistrationEngine>) -> Self {
        Self { engine }
    }

    /// Sets a registration's guest count regardless of project status.
    ///
    /// The capacity check still applies: growing a registration beyond the
    /// project ceiling is rejected even for admins.
    pub async fn force_set_guest_count(
        &self,
        registration_id: i64,
        new_count: i32,
    ) -> Result<Registration, EngineError> {
        shared::validation::validate_guest_count(new_count)
            .map_err(|_| EngineError::Validation("Guest count cannot be negative".to_string()))?;

        let registration = self
            .engine
            .bounded(
                "find_registration",
                self.engine.registrations.find(registration_id),
            )
            .await?
            .map_err(infra)?
            .ok_or(EngineError::RegistrationNotFound)?;

        if !registration.is_active() {
            return Err(EngineError::RegistrationNotFound);
        }

        let project = self.engine.load_project(registration.project_id).await?;

        tracing::info!(
            registration_id,
            project_id = project.id,
            old_count = registration.guest_count,
            new_count,
            "Admin guest-count override"
        );

        self.engine
            .apply_guest_count(&project, &registration, new_count)
            .await
    }

    /// Hard-deletes a registration and releases its seats.
    ///
    /// Distinct from cancellation: the record is removed rather than
    /// retained for audit. Irreversible; the caller boundary is responsible
    /// for confirmation.
    pub async fn delete_registration(&self, registration_id: i64) -> Result<(), EngineError> {
        let registration = self
            .engine
            .bounded(
                "find_registration",
                self.engine.registrations.find(registration_id),
            )
            .await?
            .map_err(infra)?
            .ok_or(EngineError::RegistrationNotFound)?;

        // Seed the ledger while the row still exists so the release below
        // lands on a count that includes it.
        let project = self.engine.load_project(registration.project_id).await.ok();
        if let Some(ref project) = project {
            self.engine.sync_ledger(project).await?;
        }

        let deleted = self
            .engine
            .bounded(
                "delete_registration",
                self.engine.registrations.delete(registration_id),
            )
            .await?
            .map_err(infra)?
            .ok_or(EngineError::RegistrationNotFound)?;

        // Release based on the row's state at deletion time: a concurrent
        // cancel already gave the seats back.
        if deleted.is_active() {
            self.engine
                .ledger
                .release(deleted.project_id, deleted.seats());
        }

        tracing::warn!(
            registration_id,
            project_id = deleted.project_id,
            identity = %deleted.identity,
            seats = deleted.seats(),
            was_active = deleted.is_active(),
            "Registration permanently deleted by admin"
        );
        Ok(())
    }

    /// Toggles the admin-controlled visibility flag.
    pub async fn toggle_project_active(
        &self,
        project_id: i64,
        active: bool,
    ) -> Result<Project, EngineError> {
        let updated = self
            .engine
            .bounded(
                "set_project_active",
                self.engine.projects.set_active(project_id, active),
            )
            .await?
            .map_err(infra)?;
        if !updated {
            return Err(EngineError::ProjectNotFound(project_id));
        }

        tracing::info!(project_id, active, "Project active flag changed");
        self.engine.load_project(project_id).await
    }

    /// Opens or closes a project for registration.
    pub async fn set_project_status(
        &self,
        project_id: i64,
        status: ProjectStatus,
    ) -> Result<Project, EngineError> {
        let updated = self
            .engine
            .bounded(
                "set_project_status",
                self.engine.projects.set_status(project_id, status),
            )
            .await?
            .map_err(infra)?;
        if !updated {
            return Err(EngineError::ProjectNotFound(project_id));
        }

        tracing::info!(project_id, %status, "Project status changed");
        self.engine.load_project(project_id).await
    }

    /// Changes a project's seat ceiling.
    ///
    /// Reducing it below current occupancy is accepted; the project stays
    /// over-capacity and new reservations fail until seats are released
    /// below the new ceiling. Existing registrations are never cancelled
    /// by a capacity change.
    pub async fn set_capacity(
        &self,
        project_id: i64,
        max_capacity: i32,
    ) -> Result<CapacitySnapshot, EngineError> {
        shared::validation::validate_max_capacity(max_capacity).map_err(|_| {
            EngineError::Validation("Max capacity must be greater than zero".to_string())
        })?;

        let mut project = self.engine.load_project(project_id).await?;

        let updated = self
            .engine
            .bounded(
                "set_project_capacity",
                self.engine.projects.set_max_capacity(project_id, max_capacity),
            )
            .await?
            .map_err(infra)?;
        if !updated {
            return Err(EngineError::ProjectNotFound(project_id));
        }

        project.max_capacity = max_capacity;
        self.engine.sync_ledger(&project).await?;

        let snapshot = self.engine.snapshot_of(&project)?;
        if snapshot.occupied > snapshot.max {
            tracing::warn!(
                project_id,
                occupied = snapshot.occupied,
                max = snapshot.max,
                "Project left over-capacity by admin capacity reduction"
            );
        } else {
            tracing::info!(project_id, max = snapshot.max, "Project capacity changed");
        }
        Ok(snapshot)
    }

    /// Creates a project, open and active by default.
    pub async fn create_project(&self, new: NewProject) -> Result<Project, EngineError> {
        new.validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        let project = self
            .engine
            .bounded("create_project", self.engine.projects.create(new))
            .await?
            .map_err(infra)?;

        self.engine
            .ledger
            .ensure(project.id, project.max_capacity as i64, 0);

        tracing::info!(project_id = project.id, title = %project.title, "Project created");
        Ok(project)
    }

    /// Updates a project's descriptive fields.
    pub async fn update_project(
        &self,
        project_id: i64,
        update: ProjectUpdate,
    ) -> Result<Project, EngineError> {
        update
            .validate()
            .map_err(|e| EngineError::Validation(e.to_string()))?;

        match self
            .engine
            .bounded(
                "update_project",
                self.engine.projects.update(project_id, update),
            )
            .await?
        {
            Ok(project) => Ok(project),
            Err(crate::error::StoreError::NotFound) => {
                Err(EngineError::ProjectNotFound(project_id))
            }
            Err(e) => Err(infra(e)),
        }
    }

    /// Deletes a project. Rejected while active registrations exist, so a
    /// delete can never orphan held seats.
    pub async fn delete_project(&self, project_id: i64) -> Result<(), EngineError> {
        self.engine.load_project(project_id).await?;

        let has_active = self
            .engine
            .bounded(
                "has_active_registrations",
                self.engine.registrations.has_active_for_project(project_id),
            )
            .await?
            .map_err(infra)?;
        if has_active {
            return Err(EngineError::ProjectHasRegistrations(project_id));
        }

        let deleted = self
            .engine
            .bounded("delete_project", self.engine.projects.delete(project_id))
            .await?
            .map_err(infra)?;
        if !deleted {
            return Err(EngineError::ProjectNotFound(project_id));
        }

        self.engine.ledger.remove(project_id);
        tracing::warn!(project_id, "Project deleted by admin");
        Ok(())
    }

    /// All registrations for a project (the admin roster view).
    pub async fn list_registrations(
        &self,
        project_id: i64,
    ) -> Result<Vec<Registration>, EngineError> {
        self.engine.load_project(project_id).await?;
        self.engine
            .bounded(
                "list_registrations_by_project",
                self.engine.registrations.list_by_project(project_id),
            )
            .await?
            .map_err(infra)
    }

    /// Recounts occupied seats from the store and overwrites the ledger.
    pub async fn reconcile(&self, project_id: i64) -> Result<CapacitySnapshot, EngineError> {
        self.engine.reconcile(project_id).await
    }
}
