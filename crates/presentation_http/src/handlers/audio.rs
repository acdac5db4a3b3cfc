//! Audio send handler

use application::AudioPayload;
use axum::{Json, body::Bytes, extract::State};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::{AudioApiError, INVALID_PAYLOAD_MESSAGE},
    state::AppState,
};

/// Successful audio send response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioResponse {
    pub message: String,
}

/// `POST /send-audio` with `{ number, audioUrl }`
pub async fn send_audio(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AudioResponse>, AudioApiError> {
    let value: serde_json::Value = serde_json::from_slice(&body).map_err(|e| {
        warn!(error = %e, "Rejected audio body");
        AudioApiError::BadRequest(INVALID_PAYLOAD_MESSAGE.to_string())
    })?;

    let recipient = state
        .dispatch
        .send_audio(AudioPayload::from_value(&value))
        .await?;

    info!(recipient = %recipient, "Audio request completed");
    Ok(Json(AudioResponse {
        message: "Áudio enviado com sucesso pelo SFEC!".to_string(),
    }))
}
