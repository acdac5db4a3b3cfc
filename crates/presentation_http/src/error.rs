//! API error handling
//!
//! Client-facing messages are fixed strings; the underlying cause is only
//! logged. The text endpoint answers `{ success: false, error }`, the
//! audio endpoint answers `{ error }`.

use application::ApplicationError;
use application::services::INVALID_NUMBER_MESSAGE;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Body could not be recovered into a payload
pub const INVALID_PAYLOAD_MESSAGE: &str = "Payload inválido";

/// Text send expired
pub const SEND_TIMEOUT_MESSAGE: &str = "Timeout ao enviar mensagem";

/// Text send failed for any other reason
pub const SEND_FAILED_MESSAGE: &str = "Erro ao enviar mensagem";

/// Audio send failed
pub const AUDIO_FAILED_MESSAGE: &str = "Erro ao enviar áudio";

/// Message for a client-side rejection, `None` for server-side failures
fn rejection_message(err: &ApplicationError) -> Option<String> {
    if !err.is_client_error() {
        return None;
    }
    let message = match err {
        ApplicationError::MalformedPayload(_) => INVALID_PAYLOAD_MESSAGE.to_string(),
        ApplicationError::Validation(msg) => msg.clone(),
        ApplicationError::Domain(DomainError::InvalidRecipient(_)) => {
            INVALID_NUMBER_MESSAGE.to_string()
        },
        other => other.to_string(),
    };
    Some(message)
}

/// Error for the text send endpoint
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Request timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body for the text endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,
    /// Client-facing message
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Timeout(detail) => {
                error!(detail = %detail, "Send timed out");
                (StatusCode::REQUEST_TIMEOUT, SEND_TIMEOUT_MESSAGE.to_string())
            },
            Self::Internal(detail) => {
                error!(detail = %detail, "Send failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    SEND_FAILED_MESSAGE.to_string(),
                )
            },
        };

        let body = ErrorResponse {
            success: false,
            error: message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        if let Some(message) = rejection_message(&err) {
            return Self::BadRequest(message);
        }
        match err {
            ApplicationError::Timeout(msg) => Self::Timeout(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

/// Error for the audio send endpoint
#[derive(Debug, Error)]
pub enum AudioApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body for the audio endpoint
#[derive(Debug, Serialize)]
pub struct AudioErrorResponse {
    /// Client-facing message
    pub error: String,
}

impl IntoResponse for AudioApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(detail) => {
                error!(detail = %detail, "Audio send failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AUDIO_FAILED_MESSAGE.to_string(),
                )
            },
        };
        (status, Json(AudioErrorResponse { error: message })).into_response()
    }
}

impl From<ApplicationError> for AudioApiError {
    fn from(err: ApplicationError) -> Self {
        rejection_message(&err).map_or_else(|| Self::Internal(err.to_string()), Self::BadRequest)
    }
}
