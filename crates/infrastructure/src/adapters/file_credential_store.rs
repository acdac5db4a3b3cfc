//! File-backed credential store
//!
//! Persists the session record as `creds.json` inside the configured
//! directory so a restart can resume without pairing again.

use std::path::{Path, PathBuf};

use application::error::ApplicationError;
use application::ports::{CredentialStore, Credentials};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// File name inside the auth directory
pub const CREDENTIALS_FILE: &str = "creds.json";

/// Credential store writing JSON to a local directory
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the credentials file
    pub fn path(&self) -> PathBuf {
        self.dir.join(CREDENTIALS_FILE)
    }
}

fn storage_error(action: &str, path: &Path, e: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::Storage(format!("failed to {action} {}: {e}", path.display()))
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    #[instrument(skip(self), fields(path = %self.path().display()))]
    async fn load(&self) -> Result<Option<Credentials>, ApplicationError> {
        let path = self.path();
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No stored credentials");
                return Ok(None);
            },
            Err(e) => return Err(storage_error("read", &path, e)),
        };

        let value: serde_json::Value =
            serde_json::from_slice(&raw).map_err(|e| storage_error("parse", &path, e))?;
        Ok(Some(Credentials::new(value)))
    }

    #[instrument(skip(self, credentials), fields(path = %self.path().display()))]
    async fn save(&self, credentials: &Credentials) -> Result<(), ApplicationError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| storage_error("create", &self.dir, e))?;

        let path = self.path();
        let staging = self.dir.join(format!("{CREDENTIALS_FILE}.tmp"));
        let body = serde_json::to_vec_pretty(credentials.as_value())
            .map_err(|e| storage_error("encode", &path, e))?;

        tokio::fs::write(&staging, body)
            .await
            .map_err(|e| storage_error("write", &staging, e))?;
        tokio::fs::rename(&staging, &path)
            .await
            .map_err(|e| storage_error("replace", &path, e))?;

        debug!("Credentials saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn load_from_empty_dir_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn saved_credentials_load_back() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        let creds = Credentials::new(serde_json::json!({"instance": "relay", "linked": true}));

        store.save(&creds).await.unwrap();
        let loaded = store.load().await.unwrap();

        assert_eq!(loaded, Some(creds));
        assert!(store.path().ends_with("creds.json"));
    }

    #[tokio::test]
    async fn save_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("auth"));
        let creds = Credentials::new(serde_json::json!({"k": 1}));

        store.save(&creds).await.unwrap();

        assert!(store.path().exists());
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        store
            .save(&Credentials::new(serde_json::json!({"v": 1})))
            .await
            .unwrap();
        store
            .save(&Credentials::new(serde_json::json!({"v": 2})))
            .await
            .unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.as_value()["v"], 2);
    }

    #[tokio::test]
    async fn corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CREDENTIALS_FILE), b"{not json").unwrap();
        let store = FileCredentialStore::new(dir.path());

        let result = store.load().await;
        assert!(matches!(result, Err(ApplicationError::Storage(_))));
    }
}
