//! Job HTTP route handlers.
//!
//! - POST   /api/submit     - Start a job
//! - GET    /total          - Public listing of live jobs
//! - GET    /api/jobs/{id}  - Full job record
//! - DELETE /api/jobs/{id}  - Stop a job

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::definition::{JobListing, JobRecord};
use crate::error::ApiError;
use crate::state::AppState;

const MISSING_FIELDS: &str = "Missing state, url, amount, or interval";

/// Job submission body.
///
/// `cookie` may be the credential blob as a string or as the JSON array itself.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub cookie: Option<serde_json::Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub amount: Option<u64>,
    #[serde(default)]
    pub interval: Option<f64>,
}

/// Validated submission.
#[derive(Debug)]
pub struct JobRequest {
    pub credential: String,
    pub url: String,
    pub amount: u32,
    pub interval: Duration,
}

impl SubmitRequest {
    pub fn validate(self) -> Result<JobRequest, ApiError> {
        let missing = || ApiError::BadRequest(MISSING_FIELDS.to_string());

        let credential = self.cookie.as_ref().and_then(blob_text).ok_or_else(missing)?;
        let url = self.url.filter(|u| !u.trim().is_empty()).ok_or_else(missing)?;
        let amount = self.amount.filter(|a| *a > 0).ok_or_else(missing)?;
        let interval = self.interval.filter(|i| *i != 0.0).ok_or_else(missing)?;

        let amount = u32::try_from(amount)
            .map_err(|_| ApiError::BadRequest("amount is too large".to_string()))?;
        let interval = Duration::try_from_secs_f64(interval)
            .ok()
            .filter(|d| !d.is_zero())
            .ok_or_else(|| {
                ApiError::BadRequest("interval must be a positive number of seconds".to_string())
            })?;

        Ok(JobRequest {
            credential,
            url: url.trim().to_string(),
            amount,
            interval,
        })
    }
}

/// Credential blobs arrive either as a JSON string or inline as an array.
pub(crate) fn blob_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Array(items) if !items.is_empty() => Some(value.to_string()),
        _ => None,
    }
}

/// Response for an accepted submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub status: u16,
    pub job_id: String,
}

/// Start a job.
///
/// POST /api/submit
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let request = request.validate()?;

    let jar = state.credentials.parse(&request.credential)?;
    let handle = state
        .scheduler
        .start(&jar.to_header(), &request.url, request.amount, request.interval)
        .await?;

    info!(job_id = handle.job_id(), url = %request.url, "Submission accepted");

    Ok(Json(SubmitResponse {
        status: StatusCode::OK.as_u16(),
        job_id: handle.job_id().to_string(),
    }))
}

/// List live jobs.
///
/// GET /total
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobListing>> {
    Json(state.registry().listing())
}

/// Get a job by id.
///
/// GET /api/jobs/{id}
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .registry()
        .get(&id)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Job '{}' not found", id)))
}

/// Stop a job.
///
/// DELETE /api/jobs/{id}
pub async fn stop_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.scheduler.stop(&id) {
        info!(job_id = %id, "Job stop requested");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Job '{}' not found", id)))
    }
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
