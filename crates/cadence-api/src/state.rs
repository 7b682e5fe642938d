//! Application state.

use std::sync::Arc;
use std::time::Instant;

use cadence_protocols::{ContentResolver, CredentialError, CredentialJar};

use crate::guard::GuardSessionStore;
use crate::job::{JobRegistry, JobScheduler};

/// Which credential entries matter to the API.
#[derive(Debug, Clone)]
pub struct CredentialRules {
    /// Entry a blob must carry to be accepted.
    pub required_key: String,
    /// Entry holding the account id.
    pub user_key: String,
}

impl CredentialRules {
    pub fn parse(&self, blob: &str) -> Result<CredentialJar, CredentialError> {
        CredentialJar::parse(blob, &self.required_key)
    }

    /// Account id carried by the blob, `"unknown"` when absent.
    pub fn user_id(&self, jar: &CredentialJar) -> String {
        jar.value(&self.user_key).unwrap_or("unknown").to_string()
    }
}

impl Default for CredentialRules {
    fn default() -> Self {
        Self {
            required_key: "sb".to_string(),
            user_key: "c_user".to_string(),
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub scheduler: Arc<JobScheduler>,
    pub guard_sessions: Arc<GuardSessionStore>,
    pub resolver: Arc<dyn ContentResolver>,
    pub credentials: CredentialRules,
    start_time: Instant,
}

impl AppState {
    pub fn new(
        scheduler: Arc<JobScheduler>,
        resolver: Arc<dyn ContentResolver>,
        credentials: CredentialRules,
    ) -> Self {
        Self {
            scheduler,
            guard_sessions: Arc::new(GuardSessionStore::new()),
            resolver,
            credentials,
            start_time: Instant::now(),
        }
    }

    /// Registry the scheduler writes to.
    pub fn registry(&self) -> &Arc<JobRegistry> {
        self.scheduler.registry()
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}
