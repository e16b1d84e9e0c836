//! Gmail API mailer.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde_json::json;

use super::{MailError, Mailer, OutgoingEmail};
use crate::google::{self, ServiceAccountAuth};

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Sends through `users.messages.send` as the service account (or the
/// mailbox it impersonates).
pub struct GmailMailer {
    auth: Arc<ServiceAccountAuth>,
}

impl GmailMailer {
    pub fn new(auth: Arc<ServiceAccountAuth>) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Mailer for GmailMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        let token = self.auth.access_token().await?;

        let response = self
            .auth
            .http()
            .post(SEND_URL)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(&json!({ "raw": email.to_raw() }))
            .send()
            .await
            .map_err(google::GoogleError::from)?;
        google::check_status(response).await?;

        tracing::info!("Sent notification to {}", email.to);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "gmail"
    }
}
