//! Project entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::{Project, ProjectStatus};
use sqlx::FromRow;

/// Database enum mapping for the project_status PostgreSQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
pub enum ProjectStatusDb {
    Open,
    Closed,
}

impl From<ProjectStatusDb> for ProjectStatus {
    fn from(status: ProjectStatusDb) -> Self {
        match status {
            ProjectStatusDb::Open => ProjectStatus::Open,
            ProjectStatusDb::Closed => ProjectStatus::Closed,
        }
    }
}

impl From<ProjectStatus> for ProjectStatusDb {
    fn from(status: ProjectStatus) -> Self {
        match status {
            ProjectStatus::Open => ProjectStatusDb::Open,
            ProjectStatus::Closed => ProjectStatusDb::Closed,
        }
    }
}

/// Database row mapping for the projects table.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectEntity {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub project_date: NaiveDate,
    pub location_address: String,
    pub max_capacity: i32,
    pub status: ProjectStatusDb,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectEntity> for Project {
    fn from(entity: ProjectEntity) -> Self {
        Self {
            id: entity.id,
            title: entity.title,
            description: entity.description,
            project_date: entity.project_date,
            location_address: entity.location_address,
            max_capacity: entity.max_capacity,
            status: entity.status.into(),
            active: entity.active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_round_trip() {
        for status in [ProjectStatus::Open, ProjectStatus::Closed] {
            let db: ProjectStatusDb = status.into();
            let back: ProjectStatus = db.into();
            assert_eq!(back, status);
        }
    }
}
