//! Application services - Use case implementations

mod dispatch_service;
mod liveness;
mod session_connector;

pub use dispatch_service::{
    DEFAULT_SEND_TIMEOUT, DispatchService, INVALID_NUMBER_MESSAGE, MISSING_AUDIO_FIELDS_MESSAGE,
    MISSING_TEXT_FIELDS_MESSAGE,
};
pub use liveness::{DEFAULT_FAILURE_THRESHOLD, LivenessMonitor, LivenessService, ProbeOutcome};
pub use session_connector::{
    ActiveSession, ConnectionState, ConnectorStatus, DEFAULT_INITIAL_BACKOFF_MS,
    DEFAULT_MAX_BACKOFF_MS, ReconnectPolicy, SessionConnector, SessionProvider, qr_link,
};
