//! Adapters implementing application ports

mod file_credential_store;
mod http_liveness_probe;
mod whatsapp_adapter;

pub use file_credential_store::{CREDENTIALS_FILE, FileCredentialStore};
pub use http_liveness_probe::{DEFAULT_PROBE_TIMEOUT, HttpLivenessProbe};
pub use whatsapp_adapter::{DEFAULT_POLL_INTERVAL, WhatsAppMediaAdapter, WhatsAppSessionBackend};
