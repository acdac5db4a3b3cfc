//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Recipient id is not a usable phone number after normalization
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// A required request field is absent or blank
    #[error("Missing field: {0}")]
    MissingField(String),
}

impl DomainError {
    /// Create a missing field error
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
}
