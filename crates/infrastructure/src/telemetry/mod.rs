//! Logging infrastructure
//!
//! Installs the global `tracing` subscriber with either human-readable or
//! JSON output.

mod subscriber;

pub use subscriber::{TelemetryConfig, TelemetryError, init_telemetry};
