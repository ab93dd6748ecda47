//! Registration engine.
//!
//! Orchestrates validation, admission, cancellation and guest-count
//! mutation. Capacity decisions serialize through the per-project ledger
//! entry. Ledger and store are separate systems, so every mutation follows
//! reserve, then persist, then compensate on failure, rather than assuming
//! a two-resource transaction.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, StoreError};
use crate::models::{
    AuthContext, CapacitySnapshot, ContactInfo, IdentityResolver, NewRegistration, Project,
    Registration, RegistrationStatus,
};
use crate::services::ledger::{CapacityLedger, LedgerError};
use crate::services::notification::{
    CancellationNotice, NotificationResult, NotificationSink, RegistrationNotice,
};
use crate::store::{ProjectStore, RegistrationStore};

/// How widely the one-active-registration rule applies.
///
/// Product deployments differ on whether a volunteer may hold seats on one
/// project at a time per project, or one project globally, so the rule is
/// configuration rather than code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UniquenessPolicy {
    /// One active registration per (project, identity) pair.
    #[default]
    PerProject,
    /// One active registration per identity across all projects.
    Global,
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub uniqueness: UniquenessPolicy,
    /// Upper bound on any single store call; beyond it the operation fails
    /// with a retryable timeout.
    pub store_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            uniqueness: UniquenessPolicy::PerProject,
            store_timeout: Duration::from_secs(5),
        }
    }
}

/// A signup request body, before identity resolution.
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub guest_count: i32,
    pub lead_interest: bool,
    pub contact: ContactInfo,
}

/// A project together with its current occupancy, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: Project,
    pub current_registrations: i64,
}

/// The registration/capacity allocation engine.
pub struct RegistrationEngine {
    pub(crate) projects: Arc<dyn ProjectStore>,
    pub(crate) registrations: Arc<dyn RegistrationStore>,
    pub(crate) ledger: Arc<CapacityLedger>,
    pub(crate) notifier: Arc<dyn NotificationSink>,
    pub(crate) config: EngineConfig,
}

impl RegistrationEngine {
    pub fn new(
        projects: Arc<dyn ProjectStore>,
        registrations: Arc<dyn RegistrationStore>,
        ledger: Arc<CapacityLedger>,
        notifier: Arc<dyn NotificationSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            projects,
            registrations,
            ledger,
            notifier,
            config,
        }
    }

    /// Registers the caller for a project, consuming `1 + guest_count`
    /// seats.
    pub async fn register(
        &self,
        auth: &AuthContext,
        project_id: i64,
        signup: SignupRequest,
    ) -> Result<Registration, EngineError> {
        let identity = IdentityResolver::resolve(auth, signup.contact.email.as_deref())?;

        shared::validation::validate_guest_count(signup.guest_count)
            .map_err(|e| EngineError::Validation(message_of(e)))?;
        if let Some(ref phone) = signup.contact.phone {
            shared::validation::validate_phone(phone)
                .map_err(|e| EngineError::Validation(message_of(e)))?;
        }

        let project = self.load_project(project_id).await?;
        if !project.accepts_registrations() {
            return Err(EngineError::ProjectNotOpen(project_id));
        }

        // Fast-path duplicate check. The store's uniqueness constraint is
        // the backstop for races between concurrent signups.
        if self
            .bounded(
                "find_active_registration",
                self.registrations.find_active(project_id, &identity),
            )
            .await?
            .map_err(infra)?
            .is_some()
        {
            return Err(EngineError::AlreadyRegistered { project_id });
        }
        if self.config.uniqueness == UniquenessPolicy::Global {
            if let Some(other) = self
                .bounded(
                    "find_active_by_identity",
                    self.registrations.find_active_by_identity(&identity),
                )
                .await?
                .map_err(infra)?
            {
                if other.project_id != project_id {
                    return Err(EngineError::AlreadyRegisteredElsewhere {
                        project_id: other.project_id,
                    });
                }
                return Err(EngineError::AlreadyRegistered { project_id });
            }
        }

        self.sync_ledger(&project).await?;

        let new = NewRegistration {
            project_id,
            identity,
            guest_count: signup.guest_count,
            lead_interest: signup.lead_interest,
            contact: signup.contact,
        };
        let seats = new.seats();

        self.ledger
            .try_reserve(project_id, seats)
            .map_err(ledger_err)?;

        // Seats are held from here on: every failure path must give them
        // back before returning.
        let registration = match self
            .bounded("create_registration", self.registrations.create(new))
            .await
        {
            Ok(Ok(registration)) => registration,
            Ok(Err(StoreError::Duplicate)) => {
                self.ledger.release(project_id, seats);
                return Err(EngineError::AlreadyRegistered { project_id });
            }
            Ok(Err(e)) => {
                self.ledger.release(project_id, seats);
                return Err(infra(e));
            }
            Err(timeout) => {
                self.ledger.release(project_id, seats);
                return Err(timeout);
            }
        };

        tracing::info!(
            registration_id = registration.id,
            project_id,
            identity = %registration.identity,
            seats,
            "Registration accepted"
        );

        self.notify_registered(&project, &registration);
        Ok(registration)
    }

    /// Cancels the caller's active registration on a project, releasing its
    /// seats. Cancelling an already-cancelled registration is an idempotent
    /// success so callers can safely retry.
    pub async fn cancel(
        &self,
        auth: &AuthContext,
        project_id: i64,
        supplied_email: Option<&str>,
    ) -> Result<(), EngineError> {
        let identity = IdentityResolver::resolve(auth, supplied_email)?;
        let project = self.load_project(project_id).await?;

        // Seed the ledger before the status flip so the release below
        // always lands on an entry that still counts this registration.
        self.sync_ledger(&project).await?;

        let active = self
            .bounded(
                "find_active_registration",
                self.registrations.find_active(project_id, &identity),
            )
            .await?
            .map_err(infra)?;

        let Some(registration) = active else {
            let latest = self
                .bounded(
                    "find_latest_registration",
                    self.registrations.find_latest(project_id, &identity),
                )
                .await?
                .map_err(infra)?;
            return match latest {
                Some(r) if r.status == RegistrationStatus::Cancelled => {
                    tracing::debug!(project_id, identity = %identity, "Cancel retry on already-cancelled registration");
                    Ok(())
                }
                _ => Err(EngineError::RegistrationNotFound),
            };
        };

        let cancelled = self
            .bounded(
                "cancel_registration",
                self.registrations.cancel(registration.id),
            )
            .await?
            .map_err(infra)?;

        // Release exactly the seats the row held at transition time; a
        // concurrent guest-count edit may have moved it since the lookup.
        let Some(cancelled) = cancelled else {
            // Lost the race to a concurrent cancel; the winner released the
            // seats.
            return Ok(());
        };

        self.ledger.release(project_id, cancelled.seats());

        tracing::info!(
            registration_id = cancelled.id,
            project_id,
            seats = cancelled.seats(),
            "Registration cancelled"
        );

        self.notify_cancelled(&project, &cancelled);
        Ok(())
    }

    /// Changes the guest count on the caller's own active registration.
    pub async fn update_guest_count(
        &self,
        auth: &AuthContext,
        supplied_email: Option<&str>,
        registration_id: i64,
        new_count: i32,
    ) -> Result<Registration, EngineError> {
        let identity = IdentityResolver::resolve(auth, supplied_email)?;
        shared::validation::validate_guest_count(new_count)
            .map_err(|e| EngineError::Validation(message_of(e)))?;

        let registration = self
            .bounded("find_registration", self.registrations.find(registration_id))
            .await?
            .map_err(infra)?
            .ok_or(EngineError::RegistrationNotFound)?;

        // Whether the registration belongs to someone else or does not
        // exist is indistinguishable to the caller.
        if registration.identity != identity || !registration.is_active() {
            return Err(EngineError::RegistrationNotFound);
        }

        let project = self.load_project(registration.project_id).await?;
        if !project.accepts_registrations() {
            return Err(EngineError::ProjectNotOpen(project.id));
        }

        self.apply_guest_count(&project, &registration, new_count)
            .await
    }

    /// The caller's current active registration, if any.
    pub async fn my_registration(
        &self,
        auth: &AuthContext,
        supplied_email: Option<&str>,
    ) -> Result<Option<Registration>, EngineError> {
        let identity = IdentityResolver::resolve(auth, supplied_email)?;
        self.bounded(
            "find_active_by_identity",
            self.registrations.find_active_by_identity(&identity),
        )
        .await?
        .map_err(infra)
    }

    /// All of the caller's registrations, newest last.
    pub async fn registration_history(
        &self,
        auth: &AuthContext,
        supplied_email: Option<&str>,
    ) -> Result<Vec<Registration>, EngineError> {
        let identity = IdentityResolver::resolve(auth, supplied_email)?;
        self.bounded(
            "list_registrations_by_identity",
            self.registrations.list_by_identity(&identity),
        )
        .await?
        .map_err(infra)
    }

    /// Point-in-time occupancy for a project.
    pub async fn capacity_snapshot(
        &self,
        project_id: i64,
    ) -> Result<CapacitySnapshot, EngineError> {
        let project = self.load_project(project_id).await?;
        self.sync_ledger(&project).await?;
        self.snapshot_of(&project)
    }

    /// All projects with their occupancy, for the browse view.
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, EngineError> {
        let projects = self
            .bounded("list_projects", self.projects.list())
            .await?
            .map_err(infra)?;

        let mut summaries = Vec::with_capacity(projects.len());
        for project in projects {
            self.sync_ledger(&project).await?;
            let snapshot = self.snapshot_of(&project)?;
            summaries.push(ProjectSummary {
                project,
                current_registrations: snapshot.occupied,
            });
        }
        Ok(summaries)
    }

    /// One project with its occupancy.
    pub async fn project_detail(&self, project_id: i64) -> Result<ProjectSummary, EngineError> {
        let project = self.load_project(project_id).await?;
        self.sync_ledger(&project).await?;
        let snapshot = self.snapshot_of(&project)?;
        Ok(ProjectSummary {
            project,
            current_registrations: snapshot.occupied,
        })
    }

    /// Recomputes the project's occupied seats from the store and
    /// overwrites the ledger's maintained count.
    pub async fn reconcile(&self, project_id: i64) -> Result<CapacitySnapshot, EngineError> {
        let project = self.load_project(project_id).await?;
        let occupied = self
            .bounded("recount_occupied_seats", self.registrations.occupied_seats(project_id))
            .await?
            .map_err(infra)?;
        self.ledger
            .reconcile(project_id, project.max_capacity as i64, occupied);
        self.snapshot_of(&project)
    }

    // --- internals shared with the admin override service ---

    /// Applies a guest-count change with ledger discipline.
    ///
    /// Growing the registration reserves the delta first and compensates if
    /// the persist loses its compare-and-swap; shrinking persists first and
    /// then releases, because a release can never fail.
    pub(crate) async fn apply_guest_count(
        &self,
        project: &Project,
        registration: &Registration,
        new_count: i32,
    ) -> Result<Registration, EngineError> {
        let delta = new_count as i64 - registration.guest_count as i64;
        if delta == 0 {
            return Ok(registration.clone());
        }

        self.sync_ledger(project).await?;

        if delta > 0 {
            self.ledger.adjust(project.id, delta).map_err(ledger_err)?;
            let applied = match self
                .bounded(
                    "update_guest_count",
                    self.registrations.update_guest_count(
                        registration.id,
                        registration.guest_count,
                        new_count,
                    ),
                )
                .await
            {
                Ok(Ok(applied)) => applied,
                Ok(Err(e)) => {
                    self.ledger.release(project.id, delta);
                    return Err(infra(e));
                }
                Err(timeout) => {
                    self.ledger.release(project.id, delta);
                    return Err(timeout);
                }
            };
            if !applied {
                self.ledger.release(project.id, delta);
                return Err(EngineError::Conflict);
            }
        } else {
            let applied = self
                .bounded(
                    "update_guest_count",
                    self.registrations.update_guest_count(
                        registration.id,
                        registration.guest_count,
                        new_count,
                    ),
                )
                .await?
                .map_err(infra)?;
            if !applied {
                return Err(EngineError::Conflict);
            }
            self.ledger.release(project.id, -delta);
        }

        tracing::info!(
            registration_id = registration.id,
            project_id = project.id,
            old_count = registration.guest_count,
            new_count,
            "Guest count updated"
        );

        self.bounded("find_registration", self.registrations.find(registration.id))
            .await?
            .map_err(infra)?
            .ok_or(EngineError::RegistrationNotFound)
    }

    pub(crate) async fn load_project(&self, project_id: i64) -> Result<Project, EngineError> {
        self.bounded("find_project", self.projects.find(project_id))
            .await?
            .map_err(infra)?
            .ok_or(EngineError::ProjectNotFound(project_id))
    }

    /// Seeds the project's ledger entry from a store recount on first touch
    /// and keeps its ceiling in step with the stored capacity afterwards.
    pub(crate) async fn sync_ledger(&self, project: &Project) -> Result<(), EngineError> {
        if self.ledger.contains(project.id) {
            self.ledger
                .set_max(project.id, project.max_capacity as i64)
                .map_err(ledger_err)?;
            return Ok(());
        }

        let occupied = self
            .bounded(
                "recount_occupied_seats",
                self.registrations.occupied_seats(project.id),
            )
            .await?
            .map_err(infra)?;
        self.ledger
            .ensure(project.id, project.max_capacity as i64, occupied);
        Ok(())
    }

    pub(crate) fn snapshot_of(&self, project: &Project) -> Result<CapacitySnapshot, EngineError> {
        let entry = self.ledger.snapshot(project.id).map_err(ledger_err)?;
        Ok(CapacitySnapshot {
            project_id: project.id,
            occupied: entry.occupied,
            max: entry.max,
            status: project.status,
            active: project.active,
        })
    }

    /// Runs a store call under the configured timeout.
    pub(crate) async fn bounded<T, F>(
        &self,
        op: &'static str,
        fut: F,
    ) -> Result<Result<T, StoreError>, EngineError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.config.store_timeout, fut)
            .await
            .map_err(|_| EngineError::Timeout(op))
    }

    pub(crate) fn notify_registered(&self, project: &Project, registration: &Registration) {
        let notice = RegistrationNotice::new(project, registration);
        let sink = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let NotificationResult::Failed(err) = sink.registration_confirmed(notice).await {
                tracing::warn!(error = %err, "Registration confirmation delivery failed");
            }
        });
    }

    pub(crate) fn notify_cancelled(&self, project: &Project, registration: &Registration) {
        let notice = CancellationNotice::new(project, registration);
        let sink = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            if let NotificationResult::Failed(err) = sink.registration_cancelled(notice).await {
                tracing::warn!(error = %err, "Cancellation confirmation delivery failed");
            }
        });
    }
}

pub(crate) fn infra(e: StoreError) -> EngineError {
    match e {
        StoreError::Unavailable(msg) => EngineError::StoreUnavailable(msg),
        // NotFound / Duplicate are handled where they are meaningful; here
        // they indicate a store contract violation.
        other => EngineError::Internal(other.to_string()),
    }
}

pub(crate) fn ledger_err(e: LedgerError) -> EngineError {
    match e {
        LedgerError::CapacityExceeded {
            requested,
            available,
        } => EngineError::CapacityExceeded {
            requested,
            available,
        },
        LedgerError::UnknownProject(id) => {
            EngineError::Internal(format!("No ledger entry for project {}", id))
        }
    }
}

fn message_of(e: validator::ValidationError) -> String {
    e.message
        .map(|m| m.to_string())
        .unwrap_or_else(|| "Invalid input".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewProject, ProjectStatus};
    use crate::services::notification::MockNotificationSink;
    use crate::store::memory::{InMemoryProjectStore, InMemoryRegistrationStore};
    use crate::store::ProjectStore;
    use chrono::NaiveDate;

    struct Harness {
        engine: RegistrationEngine,
        projects: Arc<InMemoryProjectStore>,
    }

    fn harness(config: EngineConfig) -> Harness {
        let projects = Arc::new(InMemoryProjectStore::new());
        let registrations = Arc::new(InMemoryRegistrationStore::new());
        let engine = RegistrationEngine::new(
            projects.clone(),
            registrations,
            Arc::new(CapacityLedger::new()),
            Arc::new(MockNotificationSink::new()),
            config,
        );
        Harness { engine, projects }
    }

    async fn seed_project(harness: &Harness, capacity: i32) -> Project {
        harness
            .projects
            .create(NewProject {
                title: "Park cleanup".to_string(),
                description: String::new(),
                project_date: NaiveDate::from_ymd_opt(2026, 9, 12).unwrap(),
                location_address: "100 Main St".to_string(),
                max_capacity: capacity,
            })
            .await
            .unwrap()
    }

    fn signup(email: &str, guests: i32) -> SignupRequest {
        SignupRequest {
            guest_count: guests,
            lead_interest: false,
            contact: ContactInfo {
                email: Some(email.to_string()),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn test_register_happy_path() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;

        let reg = h
            .engine
            .register(
                &AuthContext::anonymous(),
                project.id,
                signup("jane@example.com", 2),
            )
            .await
            .unwrap();

        assert_eq!(reg.status, RegistrationStatus::Registered);
        assert_eq!(reg.guest_count, 2);

        let snapshot = h.engine.capacity_snapshot(project.id).await.unwrap();
        assert_eq!(snapshot.occupied, 3);
    }

    #[tokio::test]
    async fn test_register_unknown_project() {
        let h = harness(EngineConfig::default());
        let result = h
            .engine
            .register(&AuthContext::anonymous(), 99, signup("jane@example.com", 0))
            .await;
        assert!(matches!(result, Err(EngineError::ProjectNotFound(99))));
    }

    #[tokio::test]
    async fn test_register_closed_or_inactive_project() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        h.projects
            .set_status(project.id, ProjectStatus::Closed)
            .await
            .unwrap();

        let result = h
            .engine
            .register(
                &AuthContext::anonymous(),
                project.id,
                signup("jane@example.com", 0),
            )
            .await;
        assert!(matches!(result, Err(EngineError::ProjectNotOpen(_))));

        h.projects
            .set_status(project.id, ProjectStatus::Open)
            .await
            .unwrap();
        h.projects.set_active(project.id, false).await.unwrap();

        let result = h
            .engine
            .register(
                &AuthContext::anonymous(),
                project.id,
                signup("jane@example.com", 0),
            )
            .await;
        assert!(matches!(result, Err(EngineError::ProjectNotOpen(_))));
    }

    #[tokio::test]
    async fn test_register_negative_guest_count_rejected_before_mutation() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;

        let result = h
            .engine
            .register(
                &AuthContext::anonymous(),
                project.id,
                signup("jane@example.com", -1),
            )
            .await;
        assert!(matches!(result, Err(EngineError::Validation(_))));

        let snapshot = h.engine.capacity_snapshot(project.id).await.unwrap();
        assert_eq!(snapshot.occupied, 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_rejected() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, project.id, signup("jane@example.com", 0))
            .await
            .unwrap();

        let result = h
            .engine
            .register(&auth, project.id, signup("Jane@Example.com", 2))
            .await;
        assert!(matches!(
            result,
            Err(EngineError::AlreadyRegistered { .. })
        ));

        // Seats unchanged by the rejected attempt.
        let snapshot = h.engine.capacity_snapshot(project.id).await.unwrap();
        assert_eq!(snapshot.occupied, 1);
    }

    #[tokio::test]
    async fn test_register_capacity_exceeded() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 3).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, project.id, signup("a@example.com", 1))
            .await
            .unwrap();

        let result = h
            .engine
            .register(&auth, project.id, signup("b@example.com", 1))
            .await;
        assert!(matches!(result, Err(EngineError::CapacityExceeded { .. })));

        // Exactly-fitting request still succeeds.
        h.engine
            .register(&auth, project.id, signup("c@example.com", 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_global_uniqueness_policy() {
        let h = harness(EngineConfig {
            uniqueness: UniquenessPolicy::Global,
            ..Default::default()
        });
        let first = seed_project(&h, 5).await;
        let second = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, first.id, signup("jane@example.com", 0))
            .await
            .unwrap();

        let result = h
            .engine
            .register(&auth, second.id, signup("jane@example.com", 0))
            .await;
        assert!(matches!(
            result,
            Err(EngineError::AlreadyRegisteredElsewhere { project_id }) if project_id == first.id
        ));
    }

    #[tokio::test]
    async fn test_per_project_policy_allows_two_projects() {
        let h = harness(EngineConfig::default());
        let first = seed_project(&h, 5).await;
        let second = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, first.id, signup("jane@example.com", 0))
            .await
            .unwrap();
        h.engine
            .register(&auth, second.id, signup("jane@example.com", 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancel_releases_seats_and_is_idempotent() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, project.id, signup("jane@example.com", 3))
            .await
            .unwrap();
        assert_eq!(
            h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
            4
        );

        h.engine
            .cancel(&auth, project.id, Some("jane@example.com"))
            .await
            .unwrap();
        assert_eq!(
            h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
            0
        );

        // Retry is a no-op success and does not double-release.
        h.engine
            .cancel(&auth, project.id, Some("jane@example.com"))
            .await
            .unwrap();
        assert_eq!(
            h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
            0
        );
    }

    #[tokio::test]
    async fn test_cancel_without_registration() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;

        let result = h
            .engine
            .cancel(
                &AuthContext::anonymous(),
                project.id,
                Some("jane@example.com"),
            )
            .await;
        assert!(matches!(result, Err(EngineError::RegistrationNotFound)));
    }

    #[tokio::test]
    async fn test_update_guest_count_owner_only() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 10).await;
        let auth = AuthContext::anonymous();

        let reg = h
            .engine
            .register(&auth, project.id, signup("jane@example.com", 1))
            .await
            .unwrap();

        let result = h
            .engine
            .update_guest_count(&auth, Some("intruder@example.com"), reg.id, 5)
            .await;
        assert!(matches!(result, Err(EngineError::RegistrationNotFound)));

        let updated = h
            .engine
            .update_guest_count(&auth, Some("jane@example.com"), reg.id, 5)
            .await
            .unwrap();
        assert_eq!(updated.guest_count, 5);
        assert_eq!(
            h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
            6
        );
    }

    #[tokio::test]
    async fn test_update_guest_count_capacity_boundary() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        let reg = h
            .engine
            .register(&auth, project.id, signup("jane@example.com", 4))
            .await
            .unwrap();

        // All five seats taken; growing fails and leaves the count alone.
        let result = h
            .engine
            .update_guest_count(&auth, Some("jane@example.com"), reg.id, 5)
            .await;
        assert!(matches!(result, Err(EngineError::CapacityExceeded { .. })));
        assert_eq!(
            h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
            5
        );

        // Shrinking frees a seat for someone else.
        h.engine
            .update_guest_count(&auth, Some("jane@example.com"), reg.id, 3)
            .await
            .unwrap();
        h.engine
            .register(&auth, project.id, signup("late@example.com", 0))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_authenticated_identity_dedup() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        let auth = AuthContext::authenticated("auth0|jane");

        h.engine
            .register(&auth, project.id, signup("jane@example.com", 0))
            .await
            .unwrap();

        // Same subject with a different contact email is still a duplicate.
        let result = h
            .engine
            .register(&auth, project.id, signup("other@example.com", 0))
            .await;
        assert!(matches!(result, Err(EngineError::AlreadyRegistered { .. })));
    }

    #[tokio::test]
    async fn test_my_registration_and_history() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        assert!(h
            .engine
            .my_registration(&auth, Some("jane@example.com"))
            .await
            .unwrap()
            .is_none());

        h.engine
            .register(&auth, project.id, signup("jane@example.com", 0))
            .await
            .unwrap();
        h.engine
            .cancel(&auth, project.id, Some("jane@example.com"))
            .await
            .unwrap();
        h.engine
            .register(&auth, project.id, signup("jane@example.com", 1))
            .await
            .unwrap();

        let active = h
            .engine
            .my_registration(&auth, Some("jane@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(active.guest_count, 1);

        let history = h
            .engine
            .registration_history(&auth, Some("jane@example.com"))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn test_list_projects_with_occupancy() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 5).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, project.id, signup("jane@example.com", 2))
            .await
            .unwrap();

        let summaries = h.engine.list_projects().await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].current_registrations, 3);
    }

    #[tokio::test]
    async fn test_reconcile_matches_store() {
        let h = harness(EngineConfig::default());
        let project = seed_project(&h, 10).await;
        let auth = AuthContext::anonymous();

        h.engine
            .register(&auth, project.id, signup("a@example.com", 2))
            .await
            .unwrap();
        h.engine
            .register(&auth, project.id, signup("b@example.com", 0))
            .await
            .unwrap();
        h.engine
            .cancel(&auth, project.id, Some("a@example.com"))
            .await
            .unwrap();

        let snapshot = h.engine.reconcile(project.id).await.unwrap();
        assert_eq!(snapshot.occupied, 1);
        assert_eq!(
            h.engine.capacity_snapshot(project.id).await.unwrap().occupied,
            1
        );
    }
}
