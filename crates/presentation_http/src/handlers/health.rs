//! Health and status handlers

use application::{ConnectionState, ConnectorStatus};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Liveness check used by the keep-alive ping
pub async fn ping() -> &'static str {
    "Pong!"
}

/// Status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub state: ConnectionState,
    pub retry_count: u32,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_close_reason: Option<String>,
    pub liveness_failures: u32,
}

/// Connector and keep-alive snapshot
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let ConnectorStatus {
        state: connection,
        retry_count,
        generation,
        qr_link,
        last_close_reason,
    } = state.connector.status();

    Json(StatusResponse {
        state: connection,
        retry_count,
        generation,
        qr_link,
        last_close_reason,
        liveness_failures: state.liveness.consecutive_failures(),
    })
}
