//! Google service-account plumbing shared by the Drive store and the Gmail mailer.

mod auth;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, DEFAULT_TOKEN_URI, DRIVE_FILE_SCOPE, GMAIL_SEND_SCOPE};

use reqwest::{Response, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GoogleError {
    #[error("invalid service account key: {0}")]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API returned {status}: {body}")]
    Api { status: StatusCode, body: String },
}

/// Turn a non-2xx response into `GoogleError::Api`, keeping the body for the caller.
pub(crate) async fn check_status(response: Response) -> Result<Response, GoogleError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GoogleError::Api { status, body })
}
