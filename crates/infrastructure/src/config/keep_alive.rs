//! Self-ping keep-alive configuration.
//!
//! Setting `url` turns the task on.

use std::time::Duration;

use application::services::DEFAULT_FAILURE_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Keep-alive configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepAliveConfig {
    /// Public health URL to ping (e.g. `https://relay.example/ping`)
    #[serde(default)]
    pub url: Option<String>,

    /// Interval between pings in seconds (default: 14 minutes)
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Per-ping timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Consecutive failures before the escalated log line
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
}

const fn default_interval() -> u64 {
    14 * 60
}

const fn default_timeout() -> u64 {
    10
}

const fn default_failure_threshold() -> u32 {
    DEFAULT_FAILURE_THRESHOLD
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: default_interval(),
            timeout_secs: default_timeout(),
            failure_threshold: default_failure_threshold(),
        }
    }
}

impl KeepAliveConfig {
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Ping target, `None` when no URL is configured
    pub fn target(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}
