use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

use crate::mail::MailError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Unknown form type: {0}")]
    UnknownFormType(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Upload failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Notification failed: {0}")]
    Mail(#[from] MailError),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::UnknownFormType(_) | ServerError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Client errors keep the submit envelope, everything else surfaces the raw message.
        let body = if status == StatusCode::BAD_REQUEST {
            json!({ "success": false, "error": self.to_string() })
        } else {
            tracing::error!("Request failed: {}", self);
            json!({ "error": self.to_string() })
        };

        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
