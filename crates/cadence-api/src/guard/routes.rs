//! Guard session route handlers.
//!
//! - GET  /api/sessions      - List sessions
//! - POST /api/guard/login   - Create a session from a credential blob
//! - POST /api/guard/toggle  - Enable or disable a session
//! - POST /api/guard/logout  - Delete a session

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::session::GuardSession;
use crate::error::{ApiError, SchedulerError};
use crate::job::routes::blob_text;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub appstate: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub status: u16,
    pub session_id: String,
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub status: u16,
    pub enabled: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: u16,
    pub message: String,
}

fn require_session_id(id: Option<String>) -> Result<String, ApiError> {
    id.filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing sessionId".to_string()))
}

/// List guard sessions.
///
/// GET /api/sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<GuardSession>> {
    Json(state.guard_sessions.list())
}

/// Create a guard session.
///
/// POST /api/guard/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let blob = request
        .appstate
        .as_ref()
        .and_then(blob_text)
        .ok_or_else(|| ApiError::BadRequest("Missing appstate".to_string()))?;

    let jar = state.credentials.parse(&blob)?;
    let cookies = jar.to_header();

    let access_token = state
        .resolver
        .derive_access_token(&cookies)
        .await
        .ok_or(SchedulerError::Auth)?;

    let session = GuardSession::new(state.credentials.user_id(&jar), cookies, access_token);
    let response = LoginResponse {
        status: StatusCode::OK.as_u16(),
        session_id: session.id.clone(),
        user_id: session.user_id.clone(),
        message: "Login successful".to_string(),
    };

    info!(session_id = %session.id, user_id = %session.user_id, "Guard session created");
    state.guard_sessions.insert(session);

    Ok(Json(response))
}

/// Enable or disable a guard session.
///
/// POST /api/guard/toggle
pub async fn toggle(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ToggleRequest>, JsonRejection>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session_id = require_session_id(request.session_id)?;

    let session = state
        .guard_sessions
        .set_enabled(&session_id, request.enabled)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;

    let message = if session.enabled {
        "Profile guard enabled"
    } else {
        "Profile guard disabled"
    };
    info!(session_id = %session_id, enabled = session.enabled, "Guard session toggled");

    Ok(Json(ToggleResponse {
        status: StatusCode::OK.as_u16(),
        enabled: session.enabled,
        message: message.to_string(),
    }))
}

/// Delete a guard session. Unknown ids are accepted.
///
/// POST /api/guard/logout
pub async fn logout(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let session_id = require_session_id(request.session_id)?;

    if state.guard_sessions.remove(&session_id).is_some() {
        info!(session_id = %session_id, "Guard session removed");
    }

    Ok(Json(MessageResponse {
        status: StatusCode::OK.as_u16(),
        message: "Logout successful".to_string(),
    }))
}
