//! Application state shared across handlers

use std::sync::Arc;

use application::{DispatchService, LivenessMonitor, SessionConnector};

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Outbound dispatcher
    pub dispatch: Arc<DispatchService>,
    /// Session connector, read for status snapshots
    pub connector: Arc<SessionConnector>,
    /// Keep-alive failure counter
    pub liveness: Arc<LivenessMonitor>,
}
