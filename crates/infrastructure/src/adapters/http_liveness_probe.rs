//! HTTP liveness probe
//!
//! Calls the service's own public health URL so the hosting platform sees
//! traffic.

use std::time::Duration;

use application::error::ApplicationError;
use application::ports::LivenessProbePort;
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

/// Default per-probe timeout
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe issuing `GET <url>` with a timeout
#[derive(Debug, Clone)]
pub struct HttpLivenessProbe {
    client: Client,
    url: String,
}

impl HttpLivenessProbe {
    /// Create a probe for `url`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ApplicationError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl LivenessProbePort for HttpLivenessProbe {
    #[instrument(skip(self), fields(url = %self.url))]
    async fn probe(&self) -> Result<String, ApplicationError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                ApplicationError::ProbeFailure(format!("timed out: {e}"))
            } else {
                ApplicationError::ProbeFailure(e.to_string())
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApplicationError::ProbeFailure(e.to_string()))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(ApplicationError::ProbeFailure(format!(
                "health endpoint returned {status}"
            )))
        }
    }
}
