//! WhatsApp integration
//!
//! REST client for the messaging gateway that owns the WhatsApp connection.

pub mod client;

pub use client::{
    ConnectResponse, EvolutionClient, EvolutionClientConfig, InstanceInfo, InstanceState,
    SendMessageResponse, WhatsAppError,
};
