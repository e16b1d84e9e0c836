pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use handlers::{approve, form, forms, health, not_found, submit, AppState};

/// Build the HTTP surface: intake, approval, catalog and health.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    // The renderer is served from elsewhere and posts cross-origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/submit", post(submit))
        .route("/approve", get(approve))
        .route("/forms", get(forms))
        .route("/forms/:id", get(form))
        .route("/health", get(health))
        .fallback(not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
