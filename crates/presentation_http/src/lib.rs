//! HTTP presentation layer
//!
//! Exposes `/send`, `/send-audio`, `/ping`, and `/status`.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod tasks;

pub use error::{ApiError, AudioApiError};
pub use routes::create_router;
pub use state::AppState;
pub use tasks::spawn_keep_alive_task;
