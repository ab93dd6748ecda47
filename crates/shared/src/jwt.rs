//! JWT bearer-token verification.
//!
//! The backend does not mint tokens itself; volunteers and admins sign in
//! through the external identity provider and present RS256-signed bearer
//! tokens. This module verifies those tokens and exposes the subject and
//! permission claims. An HS256 mode exists for local development and tests
//! where no provider key pair is available.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to decode token: {0}")]
    DecodingError(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid key: {0}")]
    InvalidKey(String),
}

/// Verified token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (stable user identifier from the identity provider)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Granted permissions (provider RBAC claim)
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl Claims {
    /// Returns true if the token carries the given permission.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Default leeway in seconds for clock skew tolerance
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Token verifier configured from the identity provider's public key.
#[derive(Clone)]
pub struct JwtVerifier {
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    /// Expected issuer (`iss` claim), verified when set.
    pub issuer: Option<String>,
    /// Expected audience (`aud` claim), verified when set.
    pub audience: Option<String>,
    /// Leeway in seconds for clock skew tolerance.
    pub leeway_secs: u64,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtVerifier {
    /// Creates a verifier from an RSA public key in PEM format (RS256).
    pub fn from_rsa_pem(
        public_key_pem: &str,
        issuer: Option<String>,
        audience: Option<String>,
    ) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            decoding_key,
            algorithm: Algorithm::RS256,
            issuer,
            audience,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        })
    }

    /// Creates an HS256 verifier from a shared secret.
    ///
    /// For local development and tests only; production deployments verify
    /// provider-signed RS256 tokens.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            issuer: None,
            audience: None,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        }
    }

    /// Verifies a bearer token and returns its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;

        if let Some(ref iss) = self.issuer {
            validation.set_issuer(&[iss]);
        }
        match self.audience {
            Some(ref aud) => validation.set_audience(&[aud]),
            // jsonwebtoken requires opting out of audience validation explicitly
            None => validation.validate_aud = false,
        }

        let token_data =
            decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidToken,
                _ => JwtError::DecodingError(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}
