//! Application configuration
//!
//! Split into focused sub-modules:
//! - `server`: HTTP server settings
//! - `session`: session connector and messaging gateway
//! - `keep_alive`: self-ping liveness task
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `config.toml` in the working directory, `RELAY_*` environment variables
//! (nested keys use `__`, e.g. `RELAY_GATEWAY__API_KEY`), and finally a
//! bare `PORT` variable for `server.port`.

mod keep_alive;
mod server;
mod session;

use serde::{Deserialize, Serialize};

pub use keep_alive::KeepAliveConfig;
pub use server::ServerConfig;
pub use session::{GatewayConfig, SessionConfig};

use crate::telemetry::TelemetryConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "RELAY";

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session connector configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Messaging gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Keep-alive configuration
    #[serde(default)]
    pub keep_alive: KeepAliveConfig,

    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment and optional file
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_sources(
            config::Environment::with_prefix(ENV_PREFIX),
            std::env::var("PORT").ok(),
        )
    }

    fn from_sources(
        env: config::Environment,
        port: Option<String>,
    ) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Start with defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Load from file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (e.g., RELAY_SERVER__PORT)
            .add_source(
                env.prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", port)?;

        let config = builder.build()?;
        config.try_deserialize()
    }
}
