//! HTTP route definitions.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::guard::routes as guard_routes;
use crate::http::monitoring;
use crate::job::routes as job_routes;
use crate::state::AppState;

/// Create the main router.
///
/// ## Route Structure
///
/// ```text
/// GET    /total              - Live jobs in listing order
///
/// /api
///   POST   /api/submit        - Start a job
///   GET    /api/jobs/{id}     - Full job record
///   DELETE /api/jobs/{id}     - Stop a job
///   GET    /api/sessions      - List guard sessions
///   POST   /api/guard/login   - Create guard session
///   POST   /api/guard/toggle  - Enable/disable guard session
///   POST   /api/guard/logout  - Delete guard session
///
/// /health  - Health summary
/// /livez   - Liveness probe
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/submit", post(job_routes::submit_job))
        .route(
            "/jobs/{id}",
            get(job_routes::get_job).delete(job_routes::stop_job),
        )
        .route("/sessions", get(guard_routes::list_sessions))
        .route("/guard/login", post(guard_routes::login))
        .route("/guard/toggle", post(guard_routes::toggle))
        .route("/guard/logout", post(guard_routes::logout));

    Router::new()
        .route("/total", get(job_routes::list_jobs))
        .route("/health", get(monitoring::health_check))
        .route("/livez", get(monitoring::liveness_probe))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
