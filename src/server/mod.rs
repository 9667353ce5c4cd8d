use anyhow::Context;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod error;
pub mod routes;

use crate::config::Config;
use crate::transcript::retry::RetryOrchestrator;
use crate::Result;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<RetryOrchestrator>,
    pub test_video_id: String,
}

impl AppState {
    pub fn new(orchestrator: RetryOrchestrator, test_video_id: impl Into<String>) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            test_video_id: test_video_id.into(),
        }
    }

    /// State backed by real YouTube sources
    pub fn from_config(config: &Config) -> Result<Self> {
        let orchestrator = RetryOrchestrator::from_config(config)?;
        Ok(Self::new(orchestrator, config.server.test_video_id.clone()))
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/test", get(routes::self_test))
        .route("/transcript", get(routes::transcript))
        .route("/transcript/formatted", get(routes::formatted_transcript))
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

/// Bind `addr` and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
