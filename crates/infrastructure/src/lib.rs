//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer: the gateway-backed
//! session and media adapters, the file credential store, and the HTTP
//! liveness probe. Also owns configuration loading and logging setup.

pub mod adapters;
pub mod config;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, GatewayConfig, KeepAliveConfig, ServerConfig, SessionConfig};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
