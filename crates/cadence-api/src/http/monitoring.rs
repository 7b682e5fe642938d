//! Health check handlers.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
    /// Entries currently listed, observation windows included.
    pub jobs: usize,
    /// Job tasks still alive.
    pub running_jobs: usize,
    pub guard_sessions: usize,
}

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime().as_secs(),
        jobs: state.registry().len(),
        running_jobs: state.scheduler.running_jobs(),
        guard_sessions: state.guard_sessions.len(),
    })
}

/// GET /livez
pub async fn liveness_probe() -> &'static str {
    "ok"
}
