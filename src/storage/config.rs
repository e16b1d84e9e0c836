//! Storage configuration.

use std::path::PathBuf;
use std::sync::Arc;

use super::{DriveStorage, FileStore, LocalStorage, S3Config, S3Storage};
use crate::config::ConfigError;
use crate::google::ServiceAccountAuth;

/// Storage backend type
#[derive(Debug, Clone)]
pub enum StorageType {
    /// Local filesystem storage
    Local { path: PathBuf },
    /// Google Drive shared folder
    Drive { folder_id: String },
    /// S3-compatible storage (AWS S3, MinIO, R2, etc.)
    S3(S3Config),
}

impl Default for StorageType {
    fn default() -> Self {
        StorageType::Local {
            path: std::env::temp_dir().join("student-intake").join("uploads"),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    /// Storage backend type
    pub storage_type: StorageType,
}

impl StorageConfig {
    /// Create config for local storage at the given path
    pub fn local(path: PathBuf) -> Self {
        Self {
            storage_type: StorageType::Local { path },
        }
    }

    /// Create config for a Drive shared folder
    pub fn drive(folder_id: String) -> Self {
        Self {
            storage_type: StorageType::Drive { folder_id },
        }
    }

    /// Create config for S3 or an S3-compatible service
    pub fn s3(config: S3Config) -> Self {
        Self {
            storage_type: StorageType::S3(config),
        }
    }

    pub fn needs_google(&self) -> bool {
        matches!(self.storage_type, StorageType::Drive { .. })
    }

    /// Build a file store from this config
    pub async fn build(
        &self,
        google: Option<Arc<ServiceAccountAuth>>,
    ) -> Result<Arc<dyn FileStore>, ConfigError> {
        match &self.storage_type {
            StorageType::Local { path } => {
                std::fs::create_dir_all(path).map_err(|e| ConfigError::Invalid {
                    key: "PORTAL_DATA_DIR".to_string(),
                    reason: format!("cannot create upload directory {}: {}", path.display(), e),
                })?;
                Ok(Arc::new(LocalStorage::new(path.clone())))
            }
            StorageType::Drive { folder_id } => {
                let auth = google.ok_or_else(|| {
                    ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_EMAIL".to_string())
                })?;
                Ok(Arc::new(DriveStorage::new(auth, folder_id.clone())))
            }
            StorageType::S3(config) => Ok(Arc::new(S3Storage::new(config.clone()).await)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_build_creates_upload_dir() {
        let temp_dir = TempDir::new().unwrap();
        let uploads = temp_dir.path().join("data").join("uploads");

        let store = StorageConfig::local(uploads.clone()).build(None).await.unwrap();
        assert_eq!(store.kind(), "local");
        assert!(uploads.is_dir());
    }

    #[tokio::test]
    async fn test_local_build_fails_on_unusable_dir() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"file").unwrap();

        let result = StorageConfig::local(blocker.join("uploads")).build(None).await;
        match result {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "PORTAL_DATA_DIR"),
            Err(other) => panic!("unexpected error {}", other),
            Ok(_) => panic!("expected an error for a path under a regular file"),
        }
    }

    #[tokio::test]
    async fn test_drive_build_needs_credentials() {
        let result = StorageConfig::drive("folder123".to_string()).build(None).await;
        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }
}
