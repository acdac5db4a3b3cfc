//! Application layer - Use cases and orchestration
//!
//! Contains the payload parser, the session connector, the outbound
//! dispatcher, the liveness monitor, and the ports adapters implement.

pub mod error;
pub mod payload_parser;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use payload_parser::{AudioPayload, PayloadInput, TextPayload, parse_lenient, parse_payload};
pub use ports::*;
pub use services::*;
