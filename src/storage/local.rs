//! Local filesystem storage backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;

use super::backend::{sanitize_object_name, FileStore, StorageResult, StoredFile};

/// Local filesystem storage backend.
///
/// Stores attachments flat under one directory:
/// ```text
/// {base_path}/
///   {appId}_{field}_{fileName}
/// ```
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    /// Create a new local storage backend
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Get the full path for a key
    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Ensure parent directory exists
    async fn ensure_parent(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for LocalStorage {
    async fn upload(&self, name: &str, _content_type: &str, data: Bytes) -> StorageResult<StoredFile> {
        let key = sanitize_object_name(name);
        let path = self.key_path(&key);
        self.ensure_parent(&path).await?;
        fs::write(&path, &data).await?;

        tracing::debug!("Stored {} bytes at {:?}", data.len(), path);

        Ok(StoredFile {
            id: key,
            web_view_link: Some(format!("file://{}", path.display())),
        })
    }

    fn kind(&self) -> &'static str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_storage_upload() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().join("uploads"));

        let data = Bytes::from("%PDF-1.4 receipt");
        let stored = storage
            .upload("APP-1_sbiReceipt_receipt.pdf", "application/pdf", data.clone())
            .await
            .unwrap();

        assert_eq!(stored.id, "APP-1_sbiReceipt_receipt.pdf");
        let on_disk = fs::read(temp_dir.path().join("uploads").join(&stored.id))
            .await
            .unwrap();
        assert_eq!(on_disk, data.as_ref());
        assert!(stored.web_view_link.unwrap().starts_with("file://"));
    }

    #[tokio::test]
    async fn test_local_storage_sanitizes_names() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_path_buf());

        let stored = storage
            .upload("APP-2_gradeCard_../../secret card.pdf", "application/pdf", Bytes::from("x"))
            .await
            .unwrap();

        assert!(!stored.id.contains('/'));
        assert!(temp_dir.path().join(&stored.id).exists());
    }
}
