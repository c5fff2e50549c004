//! Router assembly and the listener loop.

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{handlers, socket};
use crate::config::ServiceConfig;
use crate::emotion::Emotion;
use crate::pipeline::EmotionAnalyzer;

/// Shared state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<EmotionAnalyzer>,
    /// Rate assumed for raw socket buffers
    pub stream_sample_rate: u32,
    /// Where upload temp files go; system temp dir when unset
    pub temp_dir: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(analyzer: Arc<EmotionAnalyzer>, config: &ServiceConfig) -> Self {
        Self {
            analyzer,
            stream_sample_rate: config.stream_sample_rate,
            temp_dir: config.temp_dir.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.max_upload_bytes;

    Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/realtime", post(handlers::realtime))
        .route("/socket", get(socket::socket_handler))
        .route("/health", get(health_endpoint))
        .with_state(state)
        // Replace axum's 2 MiB default with the configured cap
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Bind and serve until Ctrl+C
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Emotion service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Emotion service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down...");
    }
}

/// Liveness probe
async fn health_endpoint(State(state): State<AppState>) -> Json<Value> {
    let labels: Vec<&str> = Emotion::ALL.iter().map(|e| e.as_str()).collect();
    Json(serde_json::json!({
        "healthy": true,
        "model": state.analyzer.model().describe(),
        "labels": labels,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
