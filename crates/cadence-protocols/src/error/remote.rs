//! Remote call errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote transport error: {0}")]
    Transport(String),

    #[error("Remote service answered with status {0}")]
    Status(u16),

    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Whether the failure happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, RemoteError::Transport(_))
    }
}
