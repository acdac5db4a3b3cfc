//! Outbound dispatch service
//!
//! Validates send requests and makes a single delivery attempt: text goes
//! through the current messaging session, audio through the media gateway.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use domain::{DomainError, OutboundRequest, RecipientId};
use tokio::time::timeout;
use tracing::{error, info, instrument, warn};

use super::session_connector::SessionProvider;
use crate::error::ApplicationError;
use crate::payload_parser::{AudioPayload, TextPayload};
use crate::ports::MediaGatewayPort;

/// Default upper bound for a text send
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Rejection for a recipient that is too short after normalization
pub const INVALID_NUMBER_MESSAGE: &str = "Número de telefone inválido";

/// Rejection for a text request missing `number` or `message`
pub const MISSING_TEXT_FIELDS_MESSAGE: &str = "Número e mensagem são obrigatórios";

/// Rejection for an audio request missing `number` or `audioUrl`
pub const MISSING_AUDIO_FIELDS_MESSAGE: &str = "Número e audioUrl são obrigatórios";

/// Delivers outbound requests
pub struct DispatchService {
    sessions: Arc<dyn SessionProvider>,
    media: Arc<dyn MediaGatewayPort>,
    send_timeout: Duration,
}

impl fmt::Debug for DispatchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchService")
            .field("send_timeout", &self.send_timeout)
            .finish_non_exhaustive()
    }
}

impl DispatchService {
    /// Create a dispatcher with the default 60 second text timeout
    pub fn new(sessions: Arc<dyn SessionProvider>, media: Arc<dyn MediaGatewayPort>) -> Self {
        Self {
            sessions,
            media,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the text send timeout
    #[must_use]
    pub const fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Text send timeout in use
    pub const fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Send a text message through the current session
    ///
    /// Fails fast with `Delivery` when no session is open. A send that does
    /// not finish within the timeout fails with `Timeout`.
    #[instrument(skip(self, payload))]
    pub async fn send_text(&self, payload: TextPayload) -> Result<RecipientId, ApplicationError> {
        let request = OutboundRequest::text(payload.number.as_deref(), payload.message.as_deref())
            .map_err(|e| validation_error(&e, MISSING_TEXT_FIELDS_MESSAGE))?;
        let text = request.text_body().unwrap_or_default();

        let Some(session) = self.sessions.current_session() else {
            warn!(recipient = %request.recipient, "No open session, rejecting send");
            return Err(ApplicationError::Delivery(
                "no active messaging session".to_string(),
            ));
        };

        let outcome = timeout(self.send_timeout, session.send_text(&request.recipient, text)).await;
        match outcome {
            Ok(Ok(message_id)) => {
                info!(
                    recipient = %request.recipient,
                    message_id = %message_id,
                    generation = session.generation(),
                    "Text message sent"
                );
                Ok(request.recipient)
            },
            Ok(Err(e)) if e.is_timeout() => {
                warn!(error = %e, recipient = %request.recipient, "Backend reported send timeout");
                Err(e)
            },
            Ok(Err(e)) => {
                error!(error = %e, recipient = %request.recipient, "Text message send failed");
                Err(match e {
                    ApplicationError::Delivery(_) => e,
                    other => ApplicationError::Delivery(other.to_string()),
                })
            },
            Err(_) => {
                warn!(
                    recipient = %request.recipient,
                    timeout_secs = self.send_timeout.as_secs(),
                    "Text message send timed out"
                );
                Err(ApplicationError::Timeout(format!(
                    "no response within {}s",
                    self.send_timeout.as_secs()
                )))
            },
        }
    }

    /// Send an audio message through the media gateway
    #[instrument(skip(self, payload))]
    pub async fn send_audio(&self, payload: AudioPayload) -> Result<RecipientId, ApplicationError> {
        let request =
            OutboundRequest::audio(payload.number.as_deref(), payload.audio_url.as_deref())
                .map_err(|e| validation_error(&e, MISSING_AUDIO_FIELDS_MESSAGE))?;
        let media_url = request.media_url().unwrap_or_default();

        let outcome = self.media.send_audio(&request.recipient, media_url).await;
        match outcome {
            Ok(message_id) => {
                info!(
                    recipient = %request.recipient,
                    message_id = %message_id,
                    "Audio message sent"
                );
                Ok(request.recipient)
            },
            Err(e) => {
                error!(error = %e, recipient = %request.recipient, "Audio message send failed");
                Err(ApplicationError::Delivery(e.to_string()))
            },
        }
    }
}

fn validation_error(err: &DomainError, missing_message: &str) -> ApplicationError {
    let message = match err {
        DomainError::InvalidRecipient(_) => INVALID_NUMBER_MESSAGE,
        DomainError::MissingField(_) => missing_message,
    };
    warn!(error = %err, "Rejecting send request");
    ApplicationError::Validation(message.to_string())
}
