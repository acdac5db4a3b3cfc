//! Liveness probe port

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the periodic self-health request
#[cfg_attr(test, automock)]
#[async_trait]
pub trait LivenessProbePort: Send + Sync {
    /// Call the health endpoint once, returning the response body
    ///
    /// Implementations bound the call with their own timeout and report
    /// expiry as `ApplicationError::ProbeFailure`.
    async fn probe(&self) -> Result<String, ApplicationError>;
}
