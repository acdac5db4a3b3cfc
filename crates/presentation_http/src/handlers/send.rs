//! Text send handler

use application::{PayloadInput, parse_payload};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, header::CONTENT_TYPE},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{error::ApiError, state::AppState};

/// Successful send response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendResponse {
    pub success: bool,
    pub message: String,
}

fn declares_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("application/json"))
}

/// `POST /send`
///
/// The body is taken raw; well-formed JSON is used as is, anything else
/// goes through lenient repair.
pub async fn send_message(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SendResponse>, ApiError> {
    let raw = String::from_utf8_lossy(&body);
    let input = PayloadInput::from_body(&raw, declares_json(&headers));

    let payload = parse_payload(input).inspect_err(|e| {
        warn!(error = %e, body_len = body.len(), "Rejected unparseable send body");
    })?;

    let recipient = state.dispatch.send_text(payload).await?;

    info!(recipient = %recipient, "Send request completed");
    Ok(Json(SendResponse {
        success: true,
        message: format!("Mensagem enviada pra {recipient}"),
    }))
}
