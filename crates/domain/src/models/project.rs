//! Project domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Whether a project accepts new registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Open,
    Closed,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Open => write!(f, "open"),
            ProjectStatus::Closed => write!(f, "closed"),
        }
    }
}

impl std::str::FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(ProjectStatus::Open),
            "closed" => Ok(ProjectStatus::Closed),
            other => Err(format!("Unknown project status: {}", other)),
        }
    }
}

/// A capacity-bounded volunteer event slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub project_date: NaiveDate,
    pub location_address: String,
    pub max_capacity: i32,
    pub status: ProjectStatus,
    /// Admin-controlled visibility flag.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// True when the project accepts new registrations.
    pub fn accepts_registrations(&self) -> bool {
        self.active && self.status == ProjectStatus::Open
    }
}

/// Fields for creating a project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct NewProject {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    #[serde(default)]
    pub description: String,

    pub project_date: NaiveDate,

    #[serde(default)]
    pub location_address: String,

    #[validate(custom(function = "shared::validation::validate_max_capacity"))]
    pub max_capacity: i32,
}

/// Fields for updating a project. Capacity changes go through the admin
/// override path so the ledger stays consistent.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ProjectUpdate {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description too long"))]
    #[serde(default)]
    pub description: String,

    pub project_date: NaiveDate,

    #[serde(default)]
    pub location_address: String,
}

/// Point-in-time occupancy view of a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CapacitySnapshot {
    pub project_id: i64,
    pub occupied: i64,
    pub max: i64,
    pub status: ProjectStatus,
    pub active: bool,
}

impl CapacitySnapshot {
    /// Seats still available; never negative even when an administrative
    /// capacity reduction left the project over-occupied.
    pub fn remaining(&self) -> i64 {
        (self.max - self.occupied).max(0)
    }
}
