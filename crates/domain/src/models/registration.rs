//! Registration domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;

/// Registration lifecycle status.
///
/// `Registered` consumes capacity; `Cancelled` rows are retained for audit
/// and consume nothing; `Completed` is written by a post-event batch process
/// and is terminal. There is no transition back to `Registered`; a signup
/// after cancellation creates a new record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Registered,
    Cancelled,
    Completed,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationStatus::Registered => write!(f, "registered"),
            RegistrationStatus::Cancelled => write!(f, "cancelled"),
            RegistrationStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "registered" => Ok(RegistrationStatus::Registered),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "completed" => Ok(RegistrationStatus::Completed),
            other => Err(format!("Unknown registration status: {}", other)),
        }
    }
}

/// Contact details captured with a signup. Stored for notifications and the
/// volunteer roster; never part of the deduplication key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContactInfo {
    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,

    /// Contact email; for authenticated volunteers this is stored even
    /// though their identity is the subject id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Whether the volunteer agreed to SMS reminders.
    #[serde(default)]
    pub text_permission: bool,
}

impl ContactInfo {
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            "Volunteer".to_string()
        } else {
            name.to_string()
        }
    }
}

/// A reservation of seats on a project by one identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: i64,
    pub project_id: i64,
    pub identity: Identity,
    pub status: RegistrationStatus,
    pub guest_count: i32,
    pub lead_interest: bool,
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Seats this registration consumes: one for the registrant plus one
    /// per declared guest.
    pub fn seats(&self) -> i64 {
        1 + self.guest_count as i64
    }

    pub fn is_active(&self) -> bool {
        self.status == RegistrationStatus::Registered
    }
}

/// Fields for creating a registration. Only the engine constructs these,
/// after validation and capacity reservation.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub project_id: i64,
    pub identity: Identity,
    pub guest_count: i32,
    pub lead_interest: bool,
    pub contact: ContactInfo,
}

impl NewRegistration {
    pub fn seats(&self) -> i64 {
        1 + self.guest_count as i64
    }
}
