//! HTTP server for receiving pushed sample batches.
//!
//! Some deployments have the backend push `new_data` batches instead of the
//! client pulling the stream. This server accepts those pushes and forwards
//! them into the same channel the stream reader feeds; the run loop cannot
//! tell the transports apart.
//!
//! # Architecture
//!
//! ```text
//! Backend ──→ POST /new_data ──→ channel ──→ run loop ──→ live buffer
//! ```

use crate::core::SampleBatch;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use crossbeam_channel::Sender;
use serde::Serialize;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
}

impl ServerConfig {
    /// Create a new server configuration.
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

/// Response from the ingest endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub status: String,
    /// Sample pairs queued for the run loop
    pub queued: usize,
}

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// POST /new_data
///
/// Accepts a pushed batch and queues it for the run loop. Validation happens
/// at ingest, on the consuming side; this endpoint only checks the shape.
async fn new_data(
    State(sender): State<Sender<SampleBatch>>,
    Json(batch): Json<SampleBatch>,
) -> Result<Json<IngestResponse>, (StatusCode, Json<ErrorResponse>)> {
    let queued = batch.len();

    sender.send(batch).map_err(|_| {
        tracing::error!("Run loop is gone, dropping pushed batch");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "Session is shutting down".to_string(),
                code: "SESSION_CLOSED".to_string(),
            }),
        )
    })?;

    Ok(Json(IngestResponse {
        status: "ok".to_string(),
        queued,
    }))
}

/// Run the push-ingest server.
pub async fn run(
    config: ServerConfig,
    sender: Sender<SampleBatch>,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/new_data", post(new_data))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(sender);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Push-ingest server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
