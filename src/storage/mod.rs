//! Attachment storage.
//!
//! Provides a pluggable store for uploaded files, backed by:
//! - Local filesystem (default, for development)
//! - Google Drive shared folder
//! - S3-compatible object storage (AWS S3, MinIO, R2, etc.)

mod backend;
mod config;
mod drive;
mod local;
mod s3;

pub use backend::{FileStore, StorageError, StorageResult, StoredFile};
pub use config::{StorageConfig, StorageType};
pub use drive::DriveStorage;
pub use local::LocalStorage;
pub use s3::{S3Config, S3Storage};
