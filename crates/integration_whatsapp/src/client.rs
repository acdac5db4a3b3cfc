//! Messaging gateway client
//!
//! Talks to an Evolution API instance that owns the WhatsApp connection.
//! Every request carries the instance's API key in the `apikey` header.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

/// Gateway errors
#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Missing configuration: {0}")]
    Configuration(String),
}

fn classify(err: reqwest::Error) -> WhatsAppError {
    if err.is_timeout() {
        WhatsAppError::Timeout(err.to_string())
    } else {
        WhatsAppError::Request(err)
    }
}

/// Gateway client configuration
#[derive(Debug, Clone)]
pub struct EvolutionClientConfig {
    /// Gateway base URL, e.g. `https://api.evolution-api.com`
    pub base_url: String,
    /// Instance name the gateway routes messages through
    pub instance: String,
    /// API key sent in the `apikey` header
    pub api_key: String,
    /// Prefix added to every recipient number (default: 55)
    pub country_code: String,
    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for EvolutionClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.evolution-api.com".to_string(),
            instance: String::new(),
            api_key: String::new(),
            country_code: "55".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Client for the gateway's REST API
#[derive(Debug, Clone)]
pub struct EvolutionClient {
    client: Client,
    config: EvolutionClientConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendTextRequest<'a> {
    number: String,
    #[serde(rename = "textMessage")]
    text_message: TextMessage<'a>,
}

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct SendMediaRequest<'a> {
    number: String,
    #[serde(rename = "mediaMessage")]
    media_message: MediaMessage<'a>,
}

#[derive(Debug, Serialize)]
struct MediaMessage<'a> {
    #[serde(rename = "mediaType")]
    media_type: &'static str,
    media: &'a str,
}

/// Response for a sent message
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub key: Option<MessageKey>,
    #[serde(default)]
    pub status: Option<String>,
}

impl SendMessageResponse {
    /// Gateway message id, when reported
    pub fn message_id(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageKey {
    #[serde(rename = "remoteJid", default)]
    pub remote_jid: Option<String>,
    #[serde(rename = "fromMe", default)]
    pub from_me: bool,
    pub id: String,
}

/// Connection state of the gateway instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Open,
    Connecting,
    Close,
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for InstanceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Connecting => write!(f, "connecting"),
            Self::Close => write!(f, "close"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionStateResponse {
    pub instance: InstanceInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstanceInfo {
    #[serde(rename = "instanceName")]
    pub instance_name: String,
    pub state: InstanceState,
}

/// Pairing material returned while the instance is not linked
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectResponse {
    /// Raw QR payload to render
    #[serde(default)]
    pub code: Option<String>,
    #[serde(rename = "pairingCode", default)]
    pub pairing_code: Option<String>,
    /// QR image as a data URL
    #[serde(default)]
    pub base64: Option<String>,
}

impl EvolutionClient {
    /// Create a new gateway client
    pub fn new(config: EvolutionClientConfig) -> Result<Self, WhatsAppError> {
        if config.base_url.trim().is_empty() {
            return Err(WhatsAppError::Configuration("base_url is required".to_string()));
        }
        if config.instance.trim().is_empty() {
            return Err(WhatsAppError::Configuration("instance is required".to_string()));
        }
        if config.api_key.is_empty() {
            return Err(WhatsAppError::Configuration("api_key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Instance name
    pub fn instance(&self) -> &str {
        &self.config.instance
    }

    /// Address a local number with the configured country code
    pub fn address(&self, number: &str) -> String {
        format!("{}{number}", self.config.country_code)
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}/{}", self.base_url, self.config.instance)
    }

    /// Send a text message
    #[instrument(skip(self, text), fields(number = %number))]
    pub async fn send_text(
        &self,
        number: &str,
        text: &str,
    ) -> Result<SendMessageResponse, WhatsAppError> {
        let request = SendTextRequest {
            number: self.address(number),
            text_message: TextMessage { text },
        };

        debug!(text_len = text.len(), "Sending text through gateway");

        let response = self
            .client
            .post(self.endpoint("message/sendText"))
            .header("apikey", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify)?;

        Self::parse(response).await
    }

    /// Send an audio message the gateway fetches from `media_url`
    #[instrument(skip(self), fields(number = %number))]
    pub async fn send_audio(
        &self,
        number: &str,
        media_url: &str,
    ) -> Result<SendMessageResponse, WhatsAppError> {
        let request = SendMediaRequest {
            number: self.address(number),
            media_message: MediaMessage {
                media_type: "audio",
                media: media_url,
            },
        };

        let response = self
            .client
            .post(self.endpoint("message/sendMedia"))
            .header("apikey", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify)?;

        Self::parse(response).await
    }

    /// Fetch the instance's connection state
    #[instrument(skip(self))]
    pub async fn connection_state(&self) -> Result<InstanceInfo, WhatsAppError> {
        let response = self
            .client
            .get(self.endpoint("instance/connectionState"))
            .header("apikey", &self.config.api_key)
            .send()
            .await
            .map_err(classify)?;

        let state: ConnectionStateResponse = Self::parse(response).await?;
        Ok(state.instance)
    }

    /// Ask the gateway to (re)connect; returns pairing material when unlinked
    #[instrument(skip(self))]
    pub async fn connect(&self) -> Result<ConnectResponse, WhatsAppError> {
        let response = self
            .client
            .get(self.endpoint("instance/connect"))
            .header("apikey", &self.config.api_key)
            .send()
            .await
            .map_err(classify)?;

        Self::parse(response).await
    }

    async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, WhatsAppError> {
        let status = response.status();
        if status.is_success() {
            return response.json().await.map_err(classify);
        }

        let message = response.text().await.unwrap_or_default();
        Err(WhatsAppError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
