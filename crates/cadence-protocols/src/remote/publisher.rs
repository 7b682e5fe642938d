//! Publisher trait definition.

use async_trait::async_trait;

use crate::error::RemoteError;

/// Performs the remote write a job repeats on every tick.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Issue one write against `resolved_id`.
    ///
    /// Any transport failure or non-success status is an error.
    async fn publish(
        &self,
        resolved_id: &str,
        token: &str,
        credential: &str,
    ) -> Result<(), RemoteError>;
}
