//! Participant identity resolution.
//!
//! An identity is the deduplication key for "who is registering": the stable
//! subject id from a verified session for authenticated callers, or a
//! normalized email address for anonymous signups. The same caller must
//! always resolve to the same identity across sessions and devices.

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use shared::validation::{normalize_email, validate_email};

/// Verified authentication context for an inbound request.
///
/// `subject` is the identity provider's stable subject id when the caller
/// presented a valid bearer token, `None` for anonymous requests.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    pub subject: Option<String>,
}

impl AuthContext {
    pub fn authenticated(subject: impl Into<String>) -> Self {
        Self {
            subject: Some(subject.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { subject: None }
    }
}

/// The deduplication key for a registrant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Identity {
    /// Stable subject id from the identity provider.
    Subject(String),
    /// Normalized email address for anonymous flows.
    Email(String),
}

impl Identity {
    /// Canonical storage key. Prefixed so subject ids and emails can never
    /// collide in the store's uniqueness index.
    pub fn key(&self) -> String {
        match self {
            Identity::Subject(sub) => format!("sub:{}", sub),
            Identity::Email(email) => format!("email:{}", email),
        }
    }

    /// Parses a canonical storage key back into an identity.
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some(sub) = key.strip_prefix("sub:") {
            Some(Identity::Subject(sub.to_string()))
        } else {
            key.strip_prefix("email:")
                .map(|email| Identity::Email(email.to_string()))
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Maps an inbound request to a stable participant identity.
pub struct IdentityResolver;

impl IdentityResolver {
    /// Resolves the caller to an identity.
    ///
    /// Authenticated callers always resolve to their subject id; the supplied
    /// email is kept as contact info only. Anonymous callers must supply a
    /// syntactically valid email address.
    pub fn resolve(
        auth: &AuthContext,
        supplied_email: Option<&str>,
    ) -> Result<Identity, EngineError> {
        if let Some(ref subject) = auth.subject {
            return Ok(Identity::Subject(subject.clone()));
        }

        let raw = supplied_email
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                EngineError::IdentityUnavailable("No email provided with request".to_string())
            })?;

        let email = normalize_email(raw);
        validate_email(&email)
            .map_err(|_| EngineError::IdentityUnavailable(format!("Invalid email: {}", raw)))?;

        Ok(Identity::Email(email))
    }
}
