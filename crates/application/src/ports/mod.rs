//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod credential_store;
mod liveness_probe_port;
mod media_gateway_port;
mod messaging_session;

#[cfg(test)]
pub use credential_store::MockCredentialStore;
pub use credential_store::{CredentialStore, Credentials};
#[cfg(test)]
pub use liveness_probe_port::MockLivenessProbePort;
pub use liveness_probe_port::LivenessProbePort;
#[cfg(test)]
pub use media_gateway_port::MockMediaGatewayPort;
pub use media_gateway_port::MediaGatewayPort;
#[cfg(test)]
pub use messaging_session::MockMessagingSession;
pub use messaging_session::{
    InboundMessage, MessagingSession, OpenedSession, SessionBackend, SessionEvent,
};
