//! Content resolver trait definition.

use async_trait::async_trait;

/// Maps caller input onto identifiers the external service understands.
///
/// Both lookups report failure as `None`. Implementations log the underlying
/// cause; callers never retry.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Resolve a human-readable target URL into an opaque content id.
    async fn resolve_content_id(&self, url: &str) -> Option<String>;

    /// Exchange a converted credential (cookie header) for a short-lived bearer token.
    async fn derive_access_token(&self, credential: &str) -> Option<String>;
}
