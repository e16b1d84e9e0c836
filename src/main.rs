mod api;
mod approval;
mod campus;
mod catalog;
mod config;
mod db;
mod error;
mod google;
mod intake;
mod mail;
mod notify;
mod storage;
#[cfg(test)]
mod testing;

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::AppState;
use config::{ConfigError, MailerKind, PortalConfig};
use google::{ServiceAccountAuth, DRIVE_FILE_SCOPE, GMAIL_SEND_SCOPE};
use intake::{IntakeService, Integrations};
use mail::{GmailMailer, LogMailer, Mailer};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_intake=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match PortalConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");

    // Initialize database
    let db = db::init_database(&config.database_url)
        .await
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    let integrations = match build_integrations(&config).await {
        Ok(integrations) => integrations,
        Err(e) => {
            tracing::error!("Integration setup failed: {}", e);
            std::process::exit(1);
        }
    };

    let campuses = Arc::new(config.campuses.clone());
    let state = Arc::new(AppState {
        db: db.clone(),
        intake: IntakeService::new(db, campuses.clone(), integrations),
        campuses,
        public_url: config.public_url.clone(),
    });

    let app = api::router(state, config.max_upload_bytes);

    tracing::info!("Student intake portal starting on http://{}", config.bind);
    tracing::info!("  POST /submit   - Submit an application (multipart)");
    tracing::info!("  GET  /approve  - Record a director decision");
    tracing::info!("  GET  /forms    - Form catalog");

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Server stopped");
}

/// Storage and mail connectors, or `None` when integrations are disabled.
async fn build_integrations(config: &PortalConfig) -> Result<Option<Integrations>, ConfigError> {
    if !config.integrations {
        tracing::warn!("Integrations disabled: uploads are discarded and no mail is sent");
        return Ok(None);
    }

    let google = match &config.google {
        Some(key) if config.needs_google() => {
            let mut scopes = Vec::new();
            if config.storage.needs_google() {
                scopes.push(DRIVE_FILE_SCOPE);
            }
            if config.mailer == MailerKind::Gmail {
                scopes.push(GMAIL_SEND_SCOPE);
            }
            let auth = ServiceAccountAuth::new(key.clone(), scopes, reqwest::Client::new())
                .map_err(|e| ConfigError::Invalid {
                    key: "GOOGLE_PRIVATE_KEY".to_string(),
                    reason: e.to_string(),
                })?;
            Some(Arc::new(auth))
        }
        _ => None,
    };

    let files = config.storage.build(google.clone()).await?;

    let mailer: Arc<dyn Mailer> = match config.mailer {
        MailerKind::Log => Arc::new(LogMailer),
        MailerKind::Gmail => {
            let auth = google.ok_or_else(|| {
                ConfigError::Missing("GOOGLE_SERVICE_ACCOUNT_EMAIL".to_string())
            })?;
            Arc::new(GmailMailer::new(auth))
        }
    };

    tracing::info!(
        "Uploads go to {} storage, notifications via {}",
        files.kind(),
        mailer.kind()
    );

    Ok(Some(Integrations { files, mailer }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
        tracing::info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
