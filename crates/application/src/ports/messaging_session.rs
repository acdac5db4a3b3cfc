//! Messaging session ports
//!
//! A `SessionBackend` opens connections to the messaging backend. Each open
//! yields a `MessagingSession` for sending and a typed event stream that
//! reports the connection's lifecycle.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use domain::RecipientId;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::credential_store::Credentials;
use crate::error::ApplicationError;

/// A message received on the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Backend message id
    pub id: String,
    /// Sender address as reported by the backend
    pub from: String,
    /// Text content, if any
    #[serde(default)]
    pub text: Option<String>,
    /// Whether the message was sent by this account
    #[serde(default)]
    pub from_me: bool,
}

/// Lifecycle events emitted by an open connection
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The backend needs the operator to scan a pairing code
    QrChallenge(String),
    /// The connection is authenticated and can send
    Open,
    /// The connection is gone
    Close {
        /// Human-readable reason reported by the backend
        reason: String,
    },
    /// Auth state changed and should be persisted
    CredentialsUpdated(Credentials),
    /// New inbound messages
    MessagesUpserted(Vec<InboundMessage>),
}

/// Send side of a live connection
#[cfg_attr(test, automock)]
#[async_trait]
pub trait MessagingSession: Send + Sync {
    /// Send a text message, returning the backend's message id
    async fn send_text(&self, recipient: &RecipientId, text: &str)
    -> Result<String, ApplicationError>;
}

/// Result of opening a connection
pub struct OpenedSession {
    /// Send handle for this connection
    pub session: Arc<dyn MessagingSession>,
    /// Lifecycle events; the stream ending means the connection is gone
    pub events: mpsc::Receiver<SessionEvent>,
}

impl fmt::Debug for OpenedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedSession").finish_non_exhaustive()
    }
}

/// Port for establishing connections to the messaging backend
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Open a new connection using previously saved credentials
    async fn open(&self, credentials: Option<Credentials>)
    -> Result<OpenedSession, ApplicationError>;
}
