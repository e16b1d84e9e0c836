//! File store trait definition.
//!
//! Attachments are write-once: the intake pipeline uploads each file part and
//! keeps only the identifier the provider hands back.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

use crate::google::GoogleError;

/// Storage error types
#[derive(Debug)]
pub enum StorageError {
    /// IO error
    Io(std::io::Error),
    /// Provider rejected the upload or could not be reached
    Provider(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "IO error: {}", e),
            StorageError::Provider(msg) => write!(f, "Storage provider error: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<GoogleError> for StorageError {
    fn from(e: GoogleError) -> Self {
        StorageError::Provider(e.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// What the provider returns for a stored file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    /// Provider identifier, recorded in `file_attachments.provider_file_id`
    pub id: String,
    /// Browser link, when the provider offers one
    pub web_view_link: Option<String>,
}

/// Pluggable attachment storage.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Store `data` under `name` and return the provider's identifier
    async fn upload(&self, name: &str, content_type: &str, data: Bytes) -> StorageResult<StoredFile>;

    /// Short backend name for logs
    fn kind(&self) -> &'static str;
}

/// Reduce an arbitrary client file name to something safe as an object key.
pub fn sanitize_object_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_object_name() {
        assert_eq!(sanitize_object_name("grade card.pdf"), "grade_card.pdf");
        assert_eq!(sanitize_object_name("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_object_name("..."), "file");
        assert_eq!(sanitize_object_name("APP-1_affidavit_a.pdf"), "APP-1_affidavit_a.pdf");
    }
}
