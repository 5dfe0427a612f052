//! HTTP server: routes, shared state and startup

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::engine::PdfEngine;
use crate::error::Result;
use crate::service::ManipulationService;

/// Default cap on request bodies (64 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Where and how the server listens
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body, across all parts
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Immutable state shared by all handlers
pub struct AppState {
    pub service: ManipulationService,
}

impl AppState {
    pub fn new(engine: Arc<dyn PdfEngine>) -> Self {
        Self {
            service: ManipulationService::new(engine),
        }
    }
}

/// Build the application router
///
/// Used by [`serve`] and directly by tests.
pub fn router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/pdf/merge", post(handlers::merge))
        .route("/api/pdf/watermark", post(handlers::watermark))
        .route("/api/pdf/compress", post(handlers::compress))
        .route("/api/pdf/split", post(handlers::split))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until Ctrl-C
pub async fn serve(config: ServerConfig, engine: Arc<dyn PdfEngine>) -> Result<()> {
    let state = Arc::new(AppState::new(engine));
    let app = router(state, config.max_upload_bytes);

    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    info!(
        addr = %listener.local_addr()?,
        max_upload_bytes = config.max_upload_bytes,
        "Starting PDF converter API"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
