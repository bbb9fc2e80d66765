//! Session token verification.
//!
//! Sessions are issued and refreshed by the external auth service; this
//! service holds only the Ed25519 public key and turns a bearer token into a
//! [`Session`] value passed explicitly through the pipeline.

use jwt_simple::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{Role, Session};

/// Custom claims carried alongside the standard JWT claims. The subject is the
/// user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub name: String,
    pub role: Role,
    pub branch_id: Option<Uuid>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session public key")]
    InvalidKey,

    #[error("invalid or expired session token")]
    InvalidToken,

    #[error("session token has no usable subject")]
    InvalidSubject,
}

#[derive(Clone)]
pub struct SessionVerifier {
    public_key: Ed25519PublicKey,
    issuer: Option<String>,
    audience: Option<String>,
}

impl SessionVerifier {
    /// Builds a verifier from a base64-encoded Ed25519 public key, the format
    /// the session provider publishes.
    pub fn from_public_key_b64(
        public_key_b64: &str,
        issuer: Option<String>,
        audience: Option<String>,
    ) -> Result<Self, SessionError> {
        use base64::Engine;

        let key_bytes = base64::engine::general_purpose::STANDARD
            .decode(public_key_b64)
            .map_err(|_| SessionError::InvalidKey)?;

        let public_key =
            Ed25519PublicKey::from_bytes(&key_bytes).map_err(|_| SessionError::InvalidKey)?;

        Ok(Self {
            public_key,
            issuer,
            audience,
        })
    }

    pub fn verify(&self, token: &str) -> Result<Session, SessionError> {
        let mut options = VerificationOptions::default();
        if let Some(issuer) = &self.issuer {
            options.allowed_issuers = Some(HashSet::from([issuer.clone()]));
        }
        if let Some(audience) = &self.audience {
            options.allowed_audiences = Some(HashSet::from([audience.clone()]));
        }

        let claims = self
            .public_key
            .verify_token::<SessionClaims>(token, Some(options))
            .map_err(|_| SessionError::InvalidToken)?;

        let user_id = claims
            .subject
            .as_deref()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or(SessionError::InvalidSubject)?;

        Ok(Session {
            user_id,
            display_name: claims.custom.name,
            role: claims.custom.role,
            branch_id: claims.custom.branch_id,
        })
    }
}
