//! Guard session type.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A stored credential and the token derived from it.
///
/// The cookie header and token never leave the process.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardSession {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub cookies: String,
    #[serde(skip_serializing)]
    pub access_token: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl GuardSession {
    /// Create a disabled session with a fresh id.
    pub fn new(
        user_id: impl Into<String>,
        cookies: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            cookies: cookies.into(),
            access_token: access_token.into(),
            enabled: false,
            created_at: Utc::now(),
        }
    }
}
