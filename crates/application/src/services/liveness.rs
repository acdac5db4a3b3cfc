//! Liveness tracking for the self-ping keep-alive
//!
//! Hosted deployments idle out when they receive no traffic, so the
//! service periodically calls its own health endpoint. Failures are only
//! counted and logged; nothing restarts or alerts.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tracing::{error, info, warn};

use crate::ports::LivenessProbePort;

/// Consecutive failures before the distinct warning fires
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

/// Process-wide consecutive-failure counter
#[derive(Debug)]
pub struct LivenessMonitor {
    failures: AtomicU32,
    threshold: u32,
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

impl LivenessMonitor {
    /// Create a monitor that escalates after `threshold` failures
    pub const fn new(threshold: u32) -> Self {
        Self {
            failures: AtomicU32::new(0),
            threshold,
        }
    }

    /// Reset the counter; returns the count before the reset
    pub fn record_success(&self) -> u32 {
        self.failures.swap(0, Ordering::SeqCst)
    }

    /// Bump the counter; returns the new count
    pub fn record_failure(&self) -> u32 {
        self.failures.fetch_add(1, Ordering::SeqCst).saturating_add(1)
    }

    /// Current consecutive failure count
    pub fn consecutive_failures(&self) -> u32 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Escalation threshold
    pub const fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether the failure count has reached the threshold
    pub fn threshold_reached(&self) -> bool {
        self.consecutive_failures() >= self.threshold
    }
}

/// Result of one probe tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The health endpoint answered
    Healthy {
        /// Response body
        body: String,
    },
    /// The probe failed
    Failed {
        /// Consecutive failures including this one
        consecutive: u32,
        /// Whether the threshold has been reached
        escalated: bool,
    },
}

/// Runs probes and keeps the failure count
pub struct LivenessService {
    probe: Arc<dyn LivenessProbePort>,
    monitor: Arc<LivenessMonitor>,
}

impl fmt::Debug for LivenessService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LivenessService")
            .field("monitor", &self.monitor)
            .finish_non_exhaustive()
    }
}

impl LivenessService {
    /// Create a service around a probe and a shared monitor
    pub fn new(probe: Arc<dyn LivenessProbePort>, monitor: Arc<LivenessMonitor>) -> Self {
        Self { probe, monitor }
    }

    /// Shared failure counter
    pub fn monitor(&self) -> Arc<LivenessMonitor> {
        Arc::clone(&self.monitor)
    }

    /// Run one probe and update the counter
    pub async fn tick(&self) -> ProbeOutcome {
        match self.probe.probe().await {
            Ok(body) => {
                let previous = self.monitor.record_success();
                info!(body = %body, previous_failures = previous, "Keep-alive ping succeeded");
                ProbeOutcome::Healthy { body }
            },
            Err(e) => {
                let consecutive = self.monitor.record_failure();
                let escalated = consecutive >= self.monitor.threshold();
                if escalated {
                    error!(
                        error = %e,
                        consecutive,
                        "Keep-alive ping keeps failing, service may be idling out"
                    );
                } else {
                    warn!(error = %e, consecutive, "Keep-alive ping failed");
                }
                ProbeOutcome::Failed {
                    consecutive,
                    escalated,
                }
            },
        }
    }
}
