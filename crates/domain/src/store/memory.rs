//! In-memory store implementations.
//!
//! Used by unit tests and development mode. Semantics mirror the PostgreSQL
//! implementations: the uniqueness and compare-and-swap guarantees hold
//! under concurrent access because every mutation runs under one store-wide
//! mutex.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StoreError;
use crate::models::{
    Identity, NewProject, NewRegistration, Project, ProjectStatus, ProjectUpdate, Registration,
    RegistrationStatus,
};
use crate::store::{ProjectStore, RegistrationStore};

#[derive(Default)]
struct ProjectsInner {
    next_id: i64,
    projects: HashMap<i64, Project>,
}

/// In-memory [`ProjectStore`].
#[derive(Default)]
pub struct InMemoryProjectStore {
    inner: Mutex<ProjectsInner>,
}

impl InMemoryProjectStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryProjectStore {
    async fn create(&self, new: NewProject) -> Result<Project, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let now = Utc::now();
        let project = Project {
            id: inner.next_id,
            title: new.title,
            description: new.description,
            project_date: new.project_date,
            location_address: new.location_address,
            max_capacity: new.max_capacity,
            status: ProjectStatus::Open,
            active: true,
            created_at: now,
            updated_at: now,
        };
        inner.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.projects.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Project>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut projects: Vec<Project> = inner.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.project_date.cmp(&b.project_date).then(a.id.cmp(&b.id)));
        Ok(projects)
    }

    async fn update(&self, id: i64, update: ProjectUpdate) -> Result<Project, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let project = inner.projects.get_mut(&id).ok_or(StoreError::NotFound)?;
        project.title = update.title;
        project.description = update.description;
        project.project_date = update.project_date;
        project.location_address = update.location_address;
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.projects.remove(&id).is_some())
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.projects.get_mut(&id) {
            Some(project) => {
                project.active = active;
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_status(&self, id: i64, status: ProjectStatus) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.projects.get_mut(&id) {
            Some(project) => {
                project.status = status;
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_max_capacity(&self, id: i64, max_capacity: i32) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.projects.get_mut(&id) {
            Some(project) => {
                project.max_capacity = max_capacity;
                project.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
struct RegistrationsInner {
    next_id: i64,
    rows: HashMap<i64, Registration>,
}

/// In-memory [`RegistrationStore`].
#[derive(Default)]
pub struct InMemoryRegistrationStore {
    inner: Mutex<RegistrationsInner>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(&self, new: NewRegistration) -> Result<Registration, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        // Uniqueness check and insert happen under the same lock, matching
        // the partial unique index in the PostgreSQL schema.
        let duplicate = inner.rows.values().any(|r| {
            r.project_id == new.project_id
                && r.identity == new.identity
                && r.status == RegistrationStatus::Registered
        });
        if duplicate {
            return Err(StoreError::Duplicate);
        }

        inner.next_id += 1;
        let now = Utc::now();
        let registration = Registration {
            id: inner.next_id,
            project_id: new.project_id,
            identity: new.identity,
            status: RegistrationStatus::Registered,
            guest_count: new.guest_count,
            lead_interest: new.lead_interest,
            contact: new.contact,
            created_at: now,
            updated_at: now,
        };
        inner.rows.insert(registration.id, registration.clone());
        Ok(registration)
    }

    async fn find(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.rows.get(&id).cloned())
    }

    async fn find_active(
        &self,
        project_id: i64,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .values()
            .find(|r| {
                r.project_id == project_id
                    && r.identity == *identity
                    && r.status == RegistrationStatus::Registered
            })
            .cloned())
    }

    async fn find_active_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .values()
            .find(|r| r.identity == *identity && r.status == RegistrationStatus::Registered)
            .cloned())
    }

    async fn find_latest(
        &self,
        project_id: i64,
        identity: &Identity,
    ) -> Result<Option<Registration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .values()
            .filter(|r| r.project_id == project_id && r.identity == *identity)
            .max_by_key(|r| r.id)
            .cloned())
    }

    async fn cancel(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.rows.get_mut(&id) {
            Some(row) if row.status == RegistrationStatus::Registered => {
                row.status = RegistrationStatus::Cancelled;
                row.updated_at = Utc::now();
                Ok(Some(row.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn update_guest_count(
        &self,
        id: i64,
        expected: i32,
        new_count: i32,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.rows.get_mut(&id) {
            Some(row)
                if row.status == RegistrationStatus::Registered
                    && row.guest_count == expected =>
            {
                row.guest_count = new_count;
                row.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: i64) -> Result<Option<Registration>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Ok(inner.rows.remove(&id))
    }

    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Registration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Registration> = inner
            .rows
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.status.to_string(), r.id));
        Ok(rows)
    }

    async fn list_by_identity(
        &self,
        identity: &Identity,
    ) -> Result<Vec<Registration>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut rows: Vec<Registration> = inner
            .rows
            .values()
            .filter(|r| r.identity == *identity)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.id);
        Ok(rows)
    }

    async fn occupied_seats(&self, project_id: i64) -> Result<i64, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .values()
            .filter(|r| r.project_id == project_id && r.status == RegistrationStatus::Registered)
            .map(Registration::seats)
            .sum())
    }

    async fn has_active_for_project(&self, project_id: i64) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .rows
            .values()
            .any(|r| r.project_id == project_id && r.status == RegistrationStatus::Registered))
    }
}
