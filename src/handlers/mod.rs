//! HTTP boundary
//!
//! Route table:
//! - `POST /capture` - run one capture request
//! - `GET /health`, `GET /ready` - probes
//! - `GET /status` - runtime metrics

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::browser::CaptureEngine;

mod capture;
mod status;

pub use capture::{capture_handler, ErrorBody, InlineCapture};
pub use status::{
    health_handler, readiness_handler, status_handler, HealthResponse, LatencyHistogram,
    LatencyMetrics, MemoryMetrics, ServerStats, StatusResponse, SERVER_NAME, SERVER_VERSION,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The capture engine (owns browser launching and the strategies)
    pub engine: Arc<CaptureEngine>,
    /// Counters and latency timings for /status
    pub stats: Arc<ServerStats>,
}

impl AppState {
    /// Bundle an engine with a fresh stats block.
    pub fn new(engine: Arc<CaptureEngine>) -> Self {
        Self {
            engine,
            stats: Arc::new(ServerStats::new()),
        }
    }
}

/// Build the service router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/capture", post(capture_handler))
        .route("/health", get(health_handler))
        .route("/ready", get(readiness_handler))
        .route("/status", get(status_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
