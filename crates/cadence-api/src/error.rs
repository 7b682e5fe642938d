//! API error types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadence_protocols::CredentialError;
use thiserror::Error;

/// Errors raised while starting a job. No job state exists when one is returned.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The target could not be mapped to a content id.
    #[error(
        "Unable to get link id for {0}: invalid URL, or the content is not visible to this account"
    )]
    Resolution(String),

    /// The credential could not be exchanged for a bearer token.
    #[error("Unable to get access token. Please check your credential.")]
    Auth,

    /// Amount or interval outside the accepted range.
    #[error("Invalid job request: {0}")]
    InvalidRequest(String),
}

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Credential(_) => StatusCode::BAD_REQUEST,
            ApiError::Scheduler(SchedulerError::Auth) => StatusCode::UNAUTHORIZED,
            ApiError::Scheduler(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "status": status.as_u16(),
            "error": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_names_url() {
        let err = SchedulerError::Resolution("https://example.com/p/1".to_string());
        assert!(err.to_string().contains("https://example.com/p/1"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CredentialError::NotAnArray).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(SchedulerError::Auth).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(SchedulerError::Resolution("u".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("job".into()).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_into_response_status() {
        let response = ApiError::NotFound("Job 'x' not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
