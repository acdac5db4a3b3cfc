//! WhatsApp gateway adapters
//!
//! Implements the session and media ports on top of `EvolutionClient`.
//! The gateway owns the actual WhatsApp socket; the session backend polls
//! its connection state and turns transitions into `SessionEvent`s.

use std::sync::Arc;
use std::time::Duration;

use application::error::ApplicationError;
use application::ports::{
    Credentials, MediaGatewayPort, MessagingSession, OpenedSession, SessionBackend, SessionEvent,
};
use async_trait::async_trait;
use domain::RecipientId;
use integration_whatsapp::{
    EvolutionClient, EvolutionClientConfig, InstanceInfo, InstanceState, WhatsAppError,
};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

const EVENT_BUFFER: usize = 32;

/// Default connection-state polling interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

fn map_gateway_error(err: WhatsAppError) -> ApplicationError {
    match err {
        WhatsAppError::Timeout(msg) => ApplicationError::Timeout(msg),
        WhatsAppError::Api { status, message } => {
            ApplicationError::Delivery(format!("gateway returned {status}: {message}"))
        },
        WhatsAppError::Request(e) => ApplicationError::Delivery(e.to_string()),
        WhatsAppError::Configuration(msg) => ApplicationError::Configuration(msg),
    }
}

/// Session backend that drives a gateway instance
pub struct WhatsAppSessionBackend {
    client: Arc<EvolutionClient>,
    poll_interval: Duration,
}

impl WhatsAppSessionBackend {
    /// Create a backend from client configuration
    ///
    /// # Errors
    /// Returns an error if the client configuration is invalid.
    pub fn new(config: EvolutionClientConfig) -> Result<Self, WhatsAppError> {
        Ok(Self::with_client(Arc::new(EvolutionClient::new(config)?)))
    }

    /// Create a backend sharing an existing client
    pub const fn with_client(client: Arc<EvolutionClient>) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Override the polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

impl std::fmt::Debug for WhatsAppSessionBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppSessionBackend")
            .field("instance", &self.client.instance())
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SessionBackend for WhatsAppSessionBackend {
    #[instrument(skip(self, credentials), fields(instance = %self.client.instance()))]
    async fn open(
        &self,
        credentials: Option<Credentials>,
    ) -> Result<OpenedSession, ApplicationError> {
        let initial = self
            .client
            .connection_state()
            .await
            .map_err(|e| ApplicationError::ConnectionLost(e.to_string()))?;

        debug!(state = %initial.state, "Gateway instance reachable");

        let (tx, events) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(watch_connection(
            Arc::clone(&self.client),
            initial,
            self.poll_interval,
            credentials,
            tx,
        ));

        Ok(OpenedSession {
            session: Arc::new(WhatsAppGatewaySession {
                client: Arc::clone(&self.client),
            }),
            events,
        })
    }
}

/// Poll the instance until the session ends or the receiver goes away
async fn watch_connection(
    client: Arc<EvolutionClient>,
    initial: InstanceInfo,
    poll_interval: Duration,
    known: Option<Credentials>,
    tx: mpsc::Sender<SessionEvent>,
) {
    let mut info = initial;
    let mut opened = false;
    let mut last_code: Option<String> = None;

    loop {
        let event = match (info.state, opened) {
            (InstanceState::Open, false) => {
                opened = true;
                if tx.send(SessionEvent::Open).await.is_err() {
                    return;
                }
                let linked = instance_credentials(&info);
                if known.as_ref() == Some(&linked) {
                    None
                } else {
                    Some(SessionEvent::CredentialsUpdated(linked))
                }
            },
            (InstanceState::Open, true) => None,
            (state, true) => {
                let _ = tx
                    .send(SessionEvent::Close {
                        reason: format!("instance state changed to {state}"),
                    })
                    .await;
                return;
            },
            (_, false) => match client.connect().await {
                Ok(pairing) => pairing
                    .code
                    .filter(|code| last_code.as_ref() != Some(code))
                    .map(|code| {
                        last_code = Some(code.clone());
                        SessionEvent::QrChallenge(code)
                    }),
                Err(e) => {
                    let _ = tx
                        .send(SessionEvent::Close {
                            reason: format!("connect request failed: {e}"),
                        })
                        .await;
                    return;
                },
            },
        };

        if let Some(event) = event {
            if tx.send(event).await.is_err() {
                return;
            }
        }

        tokio::time::sleep(poll_interval).await;
        if tx.is_closed() {
            return;
        }

        info = match client.connection_state().await {
            Ok(next) => next,
            Err(e) => {
                let _ = tx
                    .send(SessionEvent::Close {
                        reason: format!("state poll failed: {e}"),
                    })
                    .await;
                return;
            },
        };
    }
}

/// Record of the linked instance kept between restarts
fn instance_credentials(info: &InstanceInfo) -> Credentials {
    Credentials::new(serde_json::json!({
        "instance": info.instance_name,
        "linked": true,
    }))
}

/// A live gateway session
struct WhatsAppGatewaySession {
    client: Arc<EvolutionClient>,
}

#[async_trait]
impl MessagingSession for WhatsAppGatewaySession {
    #[instrument(skip(self, text), fields(recipient = %recipient))]
    async fn send_text(
        &self,
        recipient: &RecipientId,
        text: &str,
    ) -> Result<String, ApplicationError> {
        let response = self
            .client
            .send_text(recipient.as_str(), text)
            .await
            .map_err(map_gateway_error)?;

        let id = response.message_id().unwrap_or_default().to_string();
        debug!(message_id = %id, "Text accepted by gateway");
        Ok(id)
    }
}

/// Adapter that implements `MediaGatewayPort` using `EvolutionClient`
pub struct WhatsAppMediaAdapter {
    client: Arc<EvolutionClient>,
}

impl WhatsAppMediaAdapter {
    /// Create an adapter sharing an existing client
    pub const fn new(client: Arc<EvolutionClient>) -> Self {
        Self { client }
    }
}

impl std::fmt::Debug for WhatsAppMediaAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppMediaAdapter")
            .field("instance", &self.client.instance())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl MediaGatewayPort for WhatsAppMediaAdapter {
    #[instrument(skip(self), fields(recipient = %recipient))]
    async fn send_audio(
        &self,
        recipient: &RecipientId,
        media_url: &str,
    ) -> Result<String, ApplicationError> {
        let response = self
            .client
            .send_audio(recipient.as_str(), media_url)
            .await
            .map_err(|e| {
                warn!(error = %e, "Gateway rejected audio message");
                map_gateway_error(e)
            })?;

        let id = response.message_id().unwrap_or_default().to_string();
        info!(message_id = %id, "Audio accepted by gateway");
        Ok(id)
    }
}
