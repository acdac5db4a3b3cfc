//! Credential store port
//!
//! Persists the messaging backend's auth state between process restarts.
//! The content is opaque to the application; only the backend reads it.

use std::fmt;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Opaque auth state produced by the messaging backend
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(serde_json::Value);

impl Credentials {
    /// Wrap backend-specific auth state
    pub const fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Borrow the raw auth state
    pub const fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

// Auth material never goes to logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credentials([REDACTED])")
    }
}

/// Port for loading and saving credential state
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load previously saved credentials, `None` on first start
    async fn load(&self) -> Result<Option<Credentials>, ApplicationError>;

    /// Replace the saved credentials
    async fn save(&self, credentials: &Credentials) -> Result<(), ApplicationError>;
}
