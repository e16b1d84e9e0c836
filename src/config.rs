//! Process configuration read from the environment.

use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::debug;

use crate::campus::CampusDirectory;
use crate::db;
use crate::google::{ServiceAccountKey, DEFAULT_TOKEN_URI};
use crate::storage::{S3Config, StorageConfig};

const DEFAULT_BIND: &str = "127.0.0.1:8787";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MailerKind {
    /// Log notifications instead of sending them
    Log,
    Gmail,
}

#[derive(Clone, Debug)]
pub struct PortalConfig {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    pub database_url: String,
    /// Base for approve/reject links; derived from the request when unset
    pub public_url: Option<String>,
    pub max_upload_bytes: usize,
    /// When false, uploads are discarded and no notification is sent
    pub integrations: bool,
    pub storage: StorageConfig,
    pub mailer: MailerKind,
    pub google: Option<ServiceAccountKey>,
    pub campuses: CampusDirectory,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind = parse_or(get("PORTAL_BIND"), "PORTAL_BIND", DEFAULT_BIND)?;

        let data_dir = get("PORTAL_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("student-intake"));

        let database_url = get("PORTAL_DATABASE_URL")
            .unwrap_or_else(|| db::sqlite_url(&data_dir.join("intake.db")));

        let public_url = get("PORTAL_PUBLIC_URL").map(|url| url.trim_end_matches('/').to_string());

        let max_upload_bytes = match get("PORTAL_MAX_UPLOAD_BYTES") {
            Some(raw) => parse("PORTAL_MAX_UPLOAD_BYTES", &raw)?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        let integrations = match get("PORTAL_INTEGRATIONS").as_deref() {
            None | Some("enabled") => true,
            Some("disabled") => false,
            Some(other) => return Err(invalid("PORTAL_INTEGRATIONS", other, "enabled, disabled")),
        };

        let storage = match get("PORTAL_STORAGE").as_deref() {
            None | Some("local") => StorageConfig::local(data_dir.join("uploads")),
            Some("drive") => StorageConfig::drive(
                get("GOOGLE_DRIVE_FOLDER_ID")
                    .ok_or_else(|| ConfigError::Missing("GOOGLE_DRIVE_FOLDER_ID".to_string()))?,
            ),
            Some("s3") => {
                let bucket = get("PORTAL_S3_BUCKET")
                    .ok_or_else(|| ConfigError::Missing("PORTAL_S3_BUCKET".to_string()))?;
                let region = get("PORTAL_S3_REGION").unwrap_or_else(|| {
                    debug!("PORTAL_S3_REGION not set, using default: us-east-1");
                    "us-east-1".to_string()
                });
                let mut s3 = S3Config::aws(bucket, region);
                if let Some(endpoint) = get("PORTAL_S3_ENDPOINT") {
                    s3 = s3.with_endpoint(endpoint);
                }
                if let Some(prefix) = get("PORTAL_S3_PREFIX") {
                    s3 = s3.with_prefix(prefix);
                }
                StorageConfig::s3(s3)
            }
            Some(other) => return Err(invalid("PORTAL_STORAGE", other, "local, drive, s3")),
        };

        let mailer = match get("PORTAL_MAILER").as_deref() {
            None | Some("log") => MailerKind::Log,
            Some("gmail") => MailerKind::Gmail,
            Some(other) => return Err(invalid("PORTAL_MAILER", other, "log, gmail")),
        };

        let google = match (get("GOOGLE_SERVICE_ACCOUNT_EMAIL"), get("GOOGLE_PRIVATE_KEY")) {
            (Some(email), Some(private_key)) => {
                let mut key = ServiceAccountKey::new(email, &private_key).with_token_uri(
                    get("GOOGLE_TOKEN_URI").unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string()),
                );
                if let Some(subject) = get("GOOGLE_IMPERSONATE_USER") {
                    key = key.with_subject(subject);
                }
                Some(key)
            }
            (Some(_), None) => return Err(ConfigError::Missing("GOOGLE_PRIVATE_KEY".to_string())),
            (None, Some(_)) => {
                return Err(ConfigError::Missing(
                    "GOOGLE_SERVICE_ACCOUNT_EMAIL".to_string(),
                ))
            }
            (None, None) => None,
        };

        let campuses = match get("PORTAL_CAMPUS_DIRECTORY") {
            Some(path) => CampusDirectory::from_file(PathBuf::from(path).as_path())?,
            None => CampusDirectory::default(),
        };

        let config = Self {
            bind,
            data_dir,
            database_url,
            public_url,
            max_upload_bytes,
            integrations,
            storage,
            mailer,
            google,
            campuses,
        };
        config.validate()?;
        Ok(config)
    }

    /// Google-backed connectors need credentials, but only when they will be used.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.integrations && self.needs_google() && self.google.is_none() {
            return Err(ConfigError::Missing(
                "GOOGLE_SERVICE_ACCOUNT_EMAIL".to_string(),
            ));
        }
        Ok(())
    }

    pub fn needs_google(&self) -> bool {
        self.storage.needs_google() || self.mailer == MailerKind::Gmail
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = value.unwrap_or_else(|| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });
    parse(key, &raw)
}

fn invalid(key: &str, value: &str, expected: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: format!("unknown value '{}', expected one of: {}", value, expected),
    }
}
