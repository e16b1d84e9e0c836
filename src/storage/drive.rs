//! Google Drive storage backend.
//!
//! Uploads go into one shared folder via the Drive v3 multipart upload, which
//! carries the file metadata and the media in a single `multipart/related`
//! request.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use super::backend::{FileStore, StorageError, StorageResult, StoredFile};
use crate::google::{self, ServiceAccountAuth};

const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const BOUNDARY: &str = "intake_portal_upload_boundary";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
}

/// Drive-backed attachment store
pub struct DriveStorage {
    auth: Arc<ServiceAccountAuth>,
    folder_id: String,
    upload_url: String,
}

impl DriveStorage {
    pub fn new(auth: Arc<ServiceAccountAuth>, folder_id: String) -> Self {
        Self {
            auth,
            folder_id,
            upload_url: UPLOAD_URL.to_string(),
        }
    }
}

/// Build the `multipart/related` body: JSON metadata part, then the media part.
fn related_body(folder_id: &str, name: &str, content_type: &str, data: &[u8]) -> Bytes {
    let metadata = json!({
        "name": name,
        "parents": [folder_id],
        "mimeType": content_type,
    });

    let mut body = BytesMut::with_capacity(data.len() + 512);
    body.put_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(metadata.to_string().as_bytes());
    body.put_slice(format!("\r\n--{}\r\n", BOUNDARY).as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
    body.put_slice(data);
    body.put_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body.freeze()
}

#[async_trait]
impl FileStore for DriveStorage {
    async fn upload(&self, name: &str, content_type: &str, data: Bytes) -> StorageResult<StoredFile> {
        let token = self.auth.access_token().await?;
        let body = related_body(&self.folder_id, name, content_type, &data);

        let response = self
            .auth
            .http()
            .post(&self.upload_url)
            .query(&[
                ("uploadType", "multipart"),
                ("fields", "id,webViewLink"),
                ("supportsAllDrives", "true"),
            ])
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", BOUNDARY),
            )
            .body(body)
            .send()
            .await
            .map_err(|e| StorageError::Provider(e.to_string()))?;

        let file: DriveFile = google::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StorageError::Provider(e.to_string()))?;

        tracing::debug!("Uploaded {} to Drive as {}", name, file.id);

        Ok(StoredFile {
            id: file.id,
            web_view_link: file.web_view_link,
        })
    }

    fn kind(&self) -> &'static str {
        "drive"
    }
}
