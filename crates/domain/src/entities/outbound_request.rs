//! Outbound request entity
//!
//! One message to deliver to one contact. Built per HTTP call and dropped
//! once the response is sent.

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::value_objects::RecipientId;

/// What gets delivered to the recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    /// Plain text message
    Text { text: String },
    /// Audio message fetched by the gateway from a public URL
    Audio { media_url: String },
}

/// A validated outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundRequest {
    /// Normalized recipient id
    pub recipient: RecipientId,
    /// Message body
    pub body: MessageBody,
}

impl OutboundRequest {
    /// Build a text request from optional raw fields
    ///
    /// Presence is checked before the recipient is normalized, so a request
    /// missing both fields reports the missing field rather than a bad number.
    pub fn text(number: Option<&str>, message: Option<&str>) -> Result<Self, DomainError> {
        let number = required("number", number)?;
        let message = required("message", message)?;
        let recipient = RecipientId::new(number)?;

        Ok(Self {
            recipient,
            body: MessageBody::Text {
                text: message.to_string(),
            },
        })
    }

    /// Build an audio request from optional raw fields
    pub fn audio(number: Option<&str>, media_url: Option<&str>) -> Result<Self, DomainError> {
        let number = required("number", number)?;
        let media_url = required("audioUrl", media_url)?;
        let recipient = RecipientId::new(number)?;

        Ok(Self {
            recipient,
            body: MessageBody::Audio {
                media_url: media_url.trim().to_string(),
            },
        })
    }

    /// Text content, if this is a text request
    pub fn text_body(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { text } => Some(text),
            MessageBody::Audio { .. } => None,
        }
    }

    /// Media URL, if this is an audio request
    pub fn media_url(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Audio { media_url } => Some(media_url),
            MessageBody::Text { .. } => None,
        }
    }
}

fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, DomainError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DomainError::missing(field)),
    }
}
