//! Messaging session and gateway configuration.

use std::time::Duration;

use application::services::{DEFAULT_INITIAL_BACKOFF_MS, DEFAULT_MAX_BACKOFF_MS, ReconnectPolicy};
use integration_whatsapp::EvolutionClientConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Session connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding persisted session credentials
    #[serde(default = "default_auth_dir")]
    pub auth_dir: String,

    /// First reconnect delay in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,

    /// Reconnect delay cap in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,

    /// Upper bound on a single text send
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,

    /// Gateway connection-state polling interval
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_auth_dir() -> String {
    "auth_info".to_string()
}

const fn default_initial_backoff() -> u64 {
    DEFAULT_INITIAL_BACKOFF_MS
}

const fn default_max_backoff() -> u64 {
    DEFAULT_MAX_BACKOFF_MS
}

const fn default_send_timeout() -> u64 {
    60
}

const fn default_poll_interval() -> u64 {
    10
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auth_dir: default_auth_dir(),
            initial_backoff_ms: default_initial_backoff(),
            max_backoff_ms: default_max_backoff(),
            send_timeout_secs: default_send_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl SessionConfig {
    /// Reconnect backoff policy
    pub const fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay_ms: self.initial_backoff_ms,
            max_delay_ms: self.max_backoff_ms,
        }
    }

    pub const fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_secs)
    }

    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Messaging gateway configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Gateway instance name
    #[serde(default)]
    pub instance: String,

    /// API key (sensitive - uses SecretString)
    #[serde(default, skip_serializing)]
    pub api_key: Option<SecretString>,

    /// Prefix added to recipient numbers
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("instance", &self.instance)
            .field(
                "api_key",
                &if self.api_key.is_some() {
                    Some("[REDACTED]")
                } else {
                    None
                },
            )
            .field("country_code", &self.country_code)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

fn default_base_url() -> String {
    "https://api.evolution-api.com".to_string()
}

fn default_country_code() -> String {
    "55".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            instance: String::new(),
            api_key: None,
            country_code: default_country_code(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl GatewayConfig {
    /// Client configuration with the secret exposed
    pub fn client_config(&self) -> EvolutionClientConfig {
        EvolutionClientConfig {
            base_url: self.base_url.clone(),
            instance: self.instance.clone(),
            api_key: self
                .api_key
                .as_ref()
                .map(|k| k.expose_secret().to_string())
                .unwrap_or_default(),
            country_code: self.country_code.clone(),
            timeout_secs: self.request_timeout_secs,
        }
    }
}
