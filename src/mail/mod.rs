//! Outgoing notification mail.

mod gmail;

pub use gmail::GmailMailer;

use async_trait::async_trait;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

use crate::google::GoogleError;

#[derive(Error, Debug)]
pub enum MailError {
    #[error("mail provider error: {0}")]
    Provider(#[from] GoogleError),
}

/// A single-part HTML message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingEmail {
    /// RFC 822 message with an HTML body.
    pub fn to_mime(&self) -> String {
        format!(
            "Content-Type: text/html; charset=\"UTF-8\"\n\
             MIME-Version: 1.0\n\
             Content-Transfer-Encoding: 7bit\n\
             to: {}\n\
             subject: {}\n\n\
             {}",
            self.to, self.subject, self.html_body
        )
    }

    /// The message in the base64url form mail APIs take as `raw`.
    pub fn to_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_mime())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError>;

    /// Short mailer name for logs
    fn kind(&self) -> &'static str;
}

/// Writes messages to the log instead of delivering them.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        tracing::info!(to = %email.to, subject = %email.subject, "Notification (not delivered)");
        tracing::debug!("{}", email.html_body);
        Ok(())
    }

    fn kind(&self) -> &'static str {
        "log"
    }
}
