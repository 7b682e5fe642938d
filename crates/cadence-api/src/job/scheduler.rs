//! Interval scheduler that drives one task per job.
//!
//! Every job owns a single tokio task. The recurring tick and the hard
//! deadline are polled from the same loop, so any terminal transition drops
//! both timers at once and ticks of one job never overlap.
//!
//! A tick due at or before the deadline starts its write even if the task
//! gets to it late. That write may run past the deadline by up to
//! `write_grace` and still counts; no write starts after the deadline.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use cadence_protocols::{ContentResolver, Publisher, RemoteError};

use super::definition::{JobRecord, JobStatus};
use super::registry::JobRegistry;
use crate::error::SchedulerError;

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Delay between a job finishing and its removal from the registry.
    pub observation_window: Duration,
    /// Keep failed jobs observable for the observation window.
    pub retain_failed: bool,
    /// How long a write already in flight at the deadline may still finish
    /// and count.
    pub write_grace: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            observation_window: Duration::from_secs(300),
            retain_failed: false,
            write_grace: Duration::from_secs(30),
        }
    }
}

/// Handle to a started job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    job_id: String,
    instance_id: Uuid,
    cancel: CancellationToken,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Stop the job and drop its registry entry. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Creates jobs and spawns the task driving each of them.
pub struct JobScheduler {
    registry: Arc<JobRegistry>,
    resolver: Arc<dyn ContentResolver>,
    publisher: Arc<dyn Publisher>,
    settings: SchedulerSettings,
    handles: Arc<DashMap<String, JobHandle>>,
    shutdown: CancellationToken,
}

impl JobScheduler {
    /// Create a new scheduler over an injected registry.
    pub fn new(
        registry: Arc<JobRegistry>,
        resolver: Arc<dyn ContentResolver>,
        publisher: Arc<dyn Publisher>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            registry,
            resolver,
            publisher,
            settings,
            handles: Arc::new(DashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn settings(&self) -> &SchedulerSettings {
        &self.settings
    }

    /// Start a job that publishes `target_count` times, once per `interval`.
    ///
    /// `credential` is the converted cookie header. Resolution and token
    /// derivation both complete before the registry is touched, so a failed
    /// start leaves no trace.
    pub async fn start(
        &self,
        credential: &str,
        target_url: &str,
        target_count: u32,
        interval: Duration,
    ) -> Result<JobHandle, SchedulerError> {
        if target_count == 0 {
            return Err(SchedulerError::InvalidRequest(
                "amount must be greater than 0".to_string(),
            ));
        }
        if interval.is_zero() {
            return Err(SchedulerError::InvalidRequest(
                "interval must be greater than 0".to_string(),
            ));
        }
        let lifetime = interval
            .checked_mul(target_count)
            .filter(|d| Instant::now().checked_add(*d).is_some())
            .ok_or_else(|| {
                SchedulerError::InvalidRequest("amount * interval is too large".to_string())
            })?;

        let resolved_id = self
            .resolver
            .resolve_content_id(target_url)
            .await
            .ok_or_else(|| SchedulerError::Resolution(target_url.to_string()))?;

        let token = self
            .resolver
            .derive_access_token(credential)
            .await
            .ok_or(SchedulerError::Auth)?;

        let record = JobRecord::new(target_url, resolved_id.clone(), target_count);
        let instance_id = record.instance_id;
        let job_id = self.registry.insert_unique(record);

        let handle = JobHandle {
            job_id: job_id.clone(),
            instance_id,
            cancel: self.shutdown.child_token(),
        };
        self.handles.insert(job_id.clone(), handle.clone());

        info!(
            job_id = %job_id,
            resolved_id = %resolved_id,
            target_count,
            interval_secs = interval.as_secs_f64(),
            "Job started"
        );

        let run = JobRun {
            job_id,
            instance_id,
            resolved_id,
            token,
            credential: credential.to_string(),
            interval,
            lifetime,
            registry: self.registry.clone(),
            publisher: self.publisher.clone(),
            settings: self.settings.clone(),
            handles: self.handles.clone(),
            cancel: handle.cancel.clone(),
        };
        tokio::spawn(run.drive());

        Ok(handle)
    }

    /// Stop a job by id. Returns `false` if no task drives that id.
    pub fn stop(&self, job_id: &str) -> bool {
        match self.handles.get(job_id) {
            Some(handle) => {
                handle.stop();
                true
            }
            None => false,
        }
    }

    /// Number of job tasks still alive, observation windows included.
    pub fn running_jobs(&self) -> usize {
        self.handles.len()
    }

    /// Stop every job. Entries are removed as their tasks observe the stop.
    pub fn shutdown(&self) {
        info!(running = self.handles.len(), "Stopping all jobs");
        self.shutdown.cancel();
    }
}

/// Lifecycle of a single job task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum JobPhase {
    /// Ticking until the target, the deadline, a failure or a stop.
    Active,
    /// Finished; the entry stays listed for the observation window.
    Completing,
    /// Entry removed, task exits.
    Terminated,
}

enum WaitEvent {
    Stopped,
    Tick(Instant),
    Deadline,
}

enum TickEvent {
    Stopped,
    Published(Result<(), RemoteError>),
    Deadline,
}

struct JobRun {
    job_id: String,
    instance_id: Uuid,
    resolved_id: String,
    token: String,
    credential: String,
    interval: Duration,
    lifetime: Duration,
    registry: Arc<JobRegistry>,
    publisher: Arc<dyn Publisher>,
    settings: SchedulerSettings,
    handles: Arc<DashMap<String, JobHandle>>,
    cancel: CancellationToken,
}

impl JobRun {
    async fn drive(self) {
        let started = Instant::now();
        let deadline = time::sleep_until(started + self.lifetime);
        tokio::pin!(deadline);

        // First tick one interval after start, never immediately.
        let mut ticker = time::interval_at(started + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut phase = JobPhase::Active;
        loop {
            phase = match phase {
                JobPhase::Active => self.wait(&mut ticker, deadline.as_mut()).await,
                JobPhase::Completing => self.observe().await,
                JobPhase::Terminated => break,
            };
        }

        self.handles
            .remove_if(&self.job_id, |_, h| h.instance_id == self.instance_id);
        debug!(job_id = %self.job_id, "Job task finished");
    }

    async fn wait(&self, ticker: &mut Interval, mut deadline: Pin<&mut Sleep>) -> JobPhase {
        // A due tick wins over a deadline firing at the same instant.
        let event = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => WaitEvent::Stopped,
            scheduled = ticker.tick() => WaitEvent::Tick(scheduled),
            _ = &mut deadline => WaitEvent::Deadline,
        };

        let deadline_at = deadline.deadline();
        match event {
            WaitEvent::Stopped => self.stop(),
            WaitEvent::Tick(scheduled) if scheduled > deadline_at => self.expire(),
            WaitEvent::Tick(_) => self.tick(deadline_at).await,
            WaitEvent::Deadline => self.expire(),
        }
    }

    async fn tick(&self, deadline_at: Instant) -> JobPhase {
        debug!(job_id = %self.job_id, "Tick");

        let cutoff = time::sleep_until(deadline_at + self.settings.write_grace);
        let event = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => TickEvent::Stopped,
            result = self.publisher.publish(&self.resolved_id, &self.token, &self.credential) => {
                TickEvent::Published(result)
            }
            _ = cutoff => TickEvent::Deadline,
        };

        match event {
            TickEvent::Stopped => self.stop(),
            TickEvent::Deadline => {
                debug!(job_id = %self.job_id, "Write still in flight past grace period, dropping it");
                self.expire()
            }
            TickEvent::Published(Ok(())) => match self.count_success() {
                JobPhase::Active if Instant::now() >= deadline_at => self.expire(),
                phase => phase,
            },
            TickEvent::Published(Err(e)) => self.fail(e),
        }
    }

    fn count_success(&self) -> JobPhase {
        let updated = self.registry.update(&self.job_id, self.instance_id, |job| {
            if job.record_success() {
                job.finish(JobStatus::Completed, None);
            }
        });

        match updated {
            None => {
                debug!(job_id = %self.job_id, "Job entry gone, dropping result");
                JobPhase::Terminated
            }
            Some(job) if job.status == JobStatus::Completed => {
                info!(
                    job_id = %self.job_id,
                    success_count = job.success_count,
                    "Job reached target"
                );
                JobPhase::Completing
            }
            Some(job) => {
                debug!(
                    job_id = %self.job_id,
                    success_count = job.success_count,
                    target_count = job.target_count,
                    "Remote write counted"
                );
                JobPhase::Active
            }
        }
    }

    fn fail(&self, error: RemoteError) -> JobPhase {
        warn!(job_id = %self.job_id, "Remote write failed, terminating job: {}", error);

        if self.settings.retain_failed {
            let kept = self.registry.update(&self.job_id, self.instance_id, |job| {
                job.finish(JobStatus::Failed, Some(error.to_string()));
            });
            if kept.is_some() {
                return JobPhase::Completing;
            }
            return JobPhase::Terminated;
        }

        self.registry.remove_instance(&self.job_id, self.instance_id);
        JobPhase::Terminated
    }

    fn expire(&self) -> JobPhase {
        let updated = self.registry.update(&self.job_id, self.instance_id, |job| {
            job.finish(JobStatus::Expired, None);
        });

        match updated {
            Some(job) => {
                info!(
                    job_id = %self.job_id,
                    success_count = job.success_count,
                    target_count = job.target_count,
                    "Job deadline reached"
                );
                JobPhase::Completing
            }
            None => JobPhase::Terminated,
        }
    }

    fn stop(&self) -> JobPhase {
        self.registry.remove_instance(&self.job_id, self.instance_id);
        info!(job_id = %self.job_id, "Job stopped");
        JobPhase::Terminated
    }

    async fn observe(&self) -> JobPhase {
        tokio::select! {
            _ = time::sleep(self.settings.observation_window) => {}
            _ = self.cancel.cancelled() => {}
        }

        if self.registry.remove_instance(&self.job_id, self.instance_id) {
            debug!(job_id = %self.job_id, "Job removed after observation window");
        }
        JobPhase::Terminated
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
