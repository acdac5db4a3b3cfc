//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status endpoints
        .route("/ping", get(handlers::health::ping))
        .route("/status", get(handlers::health::status))
        // Outbound messages
        .route("/send", post(handlers::send::send_message))
        .route("/send-audio", post(handlers::audio::send_audio))
        // Attach state
        .with_state(state)
}
