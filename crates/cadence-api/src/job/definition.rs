//! Job record and status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Timer is running.
    Active,
    /// Target count reached.
    Completed,
    /// Deadline passed before the target count was reached.
    Expired,
    /// A remote write failed. Only observable with failed retention on.
    Failed,
}

impl JobStatus {
    /// Whether the job will never tick again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Active)
    }
}

/// Registry entry for one accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Registry key, unique among live jobs.
    pub job_id: String,
    /// Identifies the run that owns this entry. A later job reusing
    /// `job_id` gets a different instance.
    pub instance_id: Uuid,
    /// URL as submitted.
    pub target_url: String,
    /// Content id returned by the resolver.
    pub resolved_id: String,
    pub success_count: u32,
    pub target_count: u32,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl JobRecord {
    /// Create an active record keyed by its resolved id.
    pub fn new(
        target_url: impl Into<String>,
        resolved_id: impl Into<String>,
        target_count: u32,
    ) -> Self {
        let resolved_id = resolved_id.into();
        Self {
            job_id: resolved_id.clone(),
            instance_id: Uuid::new_v4(),
            target_url: target_url.into(),
            resolved_id,
            success_count: 0,
            target_count,
            status: JobStatus::Active,
            created_at: Utc::now(),
            finished_at: None,
            last_error: None,
        }
    }

    /// Count one confirmed remote write. Saturates at the target.
    ///
    /// Returns `true` once the target is reached.
    pub fn record_success(&mut self) -> bool {
        if self.status == JobStatus::Active && self.success_count < self.target_count {
            self.success_count += 1;
        }
        self.is_target_reached()
    }

    pub fn is_target_reached(&self) -> bool {
        self.success_count >= self.target_count
    }

    /// Move to a terminal status. Later calls are ignored.
    pub fn finish(&mut self, status: JobStatus, error: Option<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.last_error = error;
    }
}

/// One row of the public job listing.
///
/// Field names follow the listing's wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    /// 1-based position in the listing, not a stable identifier.
    pub session: usize,
    pub url: String,
    pub count: u32,
    pub id: String,
    pub target: u32,
}

impl JobListing {
    pub fn from_record(sequence_index: usize, record: &JobRecord) -> Self {
        Self {
            session: sequence_index,
            url: record.target_url.clone(),
            count: record.success_count,
            id: record.resolved_id.clone(),
            target: record.target_count,
        }
    }
}
