//! Structured caller identity and the verification capability seam.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// A verified caller. `uid` is required and drives all ownership checks;
/// profile fields are optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: None,
        }
    }

    pub fn with_email(uid: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            email: Some(email.into()),
        }
    }
}

/// Token verification capability. Implemented externally (e.g. against an
/// identity provider); injected wherever a caller must be authenticated.
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// Development verifier: accepts any credential and yields a fixed dev
/// user. Pairs with the `auth_disabled` config override; never wire this
/// into a deployed environment.
pub struct DevVerifier;

impl IdentityVerifier for DevVerifier {
    fn verify(&self, _credential: &str) -> Result<Identity, AuthError> {
        Ok(Identity::with_email("dev-user", "dev@example.com"))
    }
}
