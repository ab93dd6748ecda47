//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::error::StoreError;
use domain::models::{ContactInfo, Identity, Registration, RegistrationStatus};
use sqlx::FromRow;

/// Database enum mapping for the registration_status PostgreSQL type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "registration_status", rename_all = "lowercase")]
pub enum RegistrationStatusDb {
    Registered,
    Cancelled,
    Completed,
}

impl From<RegistrationStatusDb> for RegistrationStatus {
    fn from(status: RegistrationStatusDb) -> Self {
        match status {
            RegistrationStatusDb::Registered => RegistrationStatus::Registered,
            RegistrationStatusDb::Cancelled => RegistrationStatus::Cancelled,
            RegistrationStatusDb::Completed => RegistrationStatus::Completed,
        }
    }
}

impl From<RegistrationStatus> for RegistrationStatusDb {
    fn from(status: RegistrationStatus) -> Self {
        match status {
            RegistrationStatus::Registered => RegistrationStatusDb::Registered,
            RegistrationStatus::Cancelled => RegistrationStatusDb::Cancelled,
            RegistrationStatus::Completed => RegistrationStatusDb::Completed,
        }
    }
}

/// Database row mapping for the registrations table. Contact fields are
/// flattened columns; `identity` is the canonical identity key.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationEntity {
    pub id: i64,
    pub project_id: i64,
    pub identity: String,
    pub status: RegistrationStatusDb,
    pub guest_count: i32,
    pub lead_interest: bool,
    pub first_name: String,
    pub last_name: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub text_permission: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<RegistrationEntity> for Registration {
    type Error = StoreError;

    fn try_from(entity: RegistrationEntity) -> Result<Self, Self::Error> {
        let identity = Identity::from_key(&entity.identity).ok_or_else(|| {
            StoreError::Unavailable(format!(
                "Corrupt identity key on registration {}: {}",
                entity.id, entity.identity
            ))
        })?;

        Ok(Self {
            id: entity.id,
            project_id: entity.project_id,
            identity,
            status: entity.status.into(),
            guest_count: entity.guest_count,
            lead_interest: entity.lead_interest,
            contact: ContactInfo {
                first_name: entity.first_name,
                last_name: entity.last_name,
                email: entity.contact_email,
                phone: entity.phone,
                text_permission: entity.text_permission,
            },
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(identity: &str) -> RegistrationEntity {
        RegistrationEntity {
            id: 1,
            project_id: 2,
            identity: identity.to_string(),
            status: RegistrationStatusDb::Registered,
            guest_count: 3,
            lead_interest: false,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            contact_email: Some("jane@example.com".to_string()),
            phone: None,
            text_permission: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let registration: Registration = entity("email:jane@example.com").try_into().unwrap();
        assert_eq!(
            registration.identity,
            Identity::Email("jane@example.com".to_string())
        );
        assert_eq!(registration.seats(), 4);
        assert_eq!(registration.contact.display_name(), "Jane Doe");
    }

    #[test]
    fn test_corrupt_identity_key_rejected() {
        let result: Result<Registration, _> = entity("garbage").try_into();
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
    }

    #[test]
    fn test_status_mapping_round_trip() {
        for status in [
            RegistrationStatus::Registered,
            RegistrationStatus::Cancelled,
            RegistrationStatus::Completed,
        ] {
            let db: RegistrationStatusDb = status.into();
            let back: RegistrationStatus = db.into();
            assert_eq!(back, status);
        }
    }
}
