//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Request body could not be repaired into a structured payload
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Request fields are missing or invalid
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Send exceeded its allotted time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Any other send failure
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The messaging session dropped; drives reconnection
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Credential state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Self-health probe failed
    #[error("Liveness probe failed: {0}")]
    ProbeFailure(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ApplicationError {
    /// Whether the error was caused by the caller's input
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Domain(_) | Self::MalformedPayload(_) | Self::Validation(_)
        )
    }

    /// Whether the error is a timeout
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
