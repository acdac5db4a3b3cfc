//! Self-ping keep-alive background task
//!
//! Hosted free tiers suspend services that see no traffic; pinging the
//! public health URL keeps the process (and its session) alive.

use std::sync::Arc;
use std::time::Duration;

use application::LivenessService;
use tracing::info;

/// Spawn a task that probes once per `interval`.
///
/// Returns a `JoinHandle` that can be used to abort the task on shutdown.
pub fn spawn_keep_alive_task(
    service: Arc<LivenessService>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!(
        interval_secs = interval.as_secs(),
        "Starting keep-alive background task"
    );

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the server is still starting.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            service.tick().await;
        }
    })
}
