//! S3-compatible storage backend.
//!
//! Works against AWS S3, MinIO, R2 and anything else speaking the S3 API.

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{BehaviorVersion, Builder, Region},
    primitives::ByteStream,
    Client,
};
use bytes::Bytes;

use super::backend::{sanitize_object_name, FileStore, StorageError, StorageResult, StoredFile};

/// S3 storage backend configuration
#[derive(Clone, Debug)]
pub struct S3Config {
    /// S3 bucket name
    pub bucket: String,
    /// Optional prefix for all keys (e.g., "intake/")
    pub prefix: Option<String>,
    /// AWS region
    pub region: String,
    /// Custom endpoint URL (for MinIO, R2, etc.)
    pub endpoint: Option<String>,
    /// Force path-style URLs (required for MinIO)
    pub force_path_style: bool,
}

impl S3Config {
    /// Create config for AWS S3
    pub fn aws(bucket: String, region: String) -> Self {
        Self {
            bucket,
            prefix: None,
            region,
            endpoint: None,
            force_path_style: false,
        }
    }

    /// Point at an S3-compatible endpoint (MinIO and friends need path-style URLs)
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = Some(endpoint);
        self.force_path_style = true;
        self
    }

    /// Set a key prefix
    pub fn with_prefix(mut self, prefix: String) -> Self {
        self.prefix = Some(prefix);
        self
    }
}

/// S3-compatible storage backend
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: Option<String>,
}

impl S3Storage {
    /// Create a new S3 storage backend from config
    pub async fn new(config: S3Config) -> Self {
        let mut builder = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region))
            .force_path_style(config.force_path_style);

        if let Some(endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        // Load credentials from environment or use defaults
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        if let Some(creds) = sdk_config.credentials_provider() {
            builder = builder.credentials_provider(creds);
        }

        let client = Client::from_conf(builder.build());

        Self {
            client,
            bucket: config.bucket,
            prefix: config.prefix,
        }
    }

    /// Build the full S3 key for an object name
    fn full_key(&self, name: &str) -> String {
        let name = sanitize_object_name(name);
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name,
        }
    }
}

#[async_trait]
impl FileStore for S3Storage {
    async fn upload(&self, name: &str, content_type: &str, data: Bytes) -> StorageResult<StoredFile> {
        let s3_key = self.full_key(name);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&s3_key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Provider(e.to_string()))?;

        Ok(StoredFile {
            web_view_link: Some(format!("s3://{}/{}", self.bucket, s3_key)),
            id: s3_key,
        })
    }

    fn kind(&self) -> &'static str {
        "s3"
    }
}
