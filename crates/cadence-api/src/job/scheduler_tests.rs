//! Tests for the job scheduler. Time is paused; tokio auto-advances it
//! whenever every task is idle.

use super::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

struct FakeResolver {
    content_id: Option<String>,
    token: Option<String>,
    resolve_calls: AtomicUsize,
    token_calls: AtomicUsize,
}

impl FakeResolver {
    fn new(content_id: Option<&str>, token: Option<&str>) -> Self {
        Self {
            content_id: content_id.map(str::to_string),
            token: token.map(str::to_string),
            resolve_calls: AtomicUsize::new(0),
            token_calls: AtomicUsize::new(0),
        }
    }

    fn ok() -> Self {
        Self::new(Some("1001"), Some("token"))
    }
}

#[async_trait]
impl ContentResolver for FakeResolver {
    async fn resolve_content_id(&self, _url: &str) -> Option<String> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        self.content_id.clone()
    }

    async fn derive_access_token(&self, _credential: &str) -> Option<String> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.token.clone()
    }
}

#[derive(Default)]
struct ScriptedPublisher {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    fail_on: Option<usize>,
    delay: Option<Duration>,
    hang: bool,
}

impl ScriptedPublisher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for ScriptedPublisher {
    async fn publish(&self, _id: &str, _token: &str, _cred: &str) -> Result<(), RemoteError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            time::sleep(delay).await;
        }
        if self.hang {
            std::future::pending::<()>().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_on == Some(n) {
            return Err(RemoteError::Status(500));
        }
        Ok(())
    }
}

struct Fixture {
    scheduler: JobScheduler,
    registry: Arc<JobRegistry>,
    resolver: Arc<FakeResolver>,
    publisher: Arc<ScriptedPublisher>,
}

fn fixture(
    resolver: FakeResolver,
    publisher: ScriptedPublisher,
    settings: SchedulerSettings,
) -> Fixture {
    let registry = Arc::new(JobRegistry::new());
    let resolver = Arc::new(resolver);
    let publisher = Arc::new(publisher);
    let scheduler = JobScheduler::new(
        registry.clone(),
        resolver.clone(),
        publisher.clone(),
        settings,
    );
    Fixture {
        scheduler,
        registry,
        resolver,
        publisher,
    }
}

async fn advance(millis: u64) {
    time::sleep(Duration::from_millis(millis)).await;
}

const URL: &str = "https://example.com/post/1";

#[tokio::test(start_paused = true)]
async fn test_job_reaches_target_then_expires_from_registry() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );

    let handle = f
        .scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(handle.job_id(), "1001");

    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.success_count, 0);
    assert_eq!(job.status, JobStatus::Active);

    advance(3_500).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.success_count, 3);
    assert_eq!(job.target_count, 3);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(f.publisher.calls(), 3);

    // Completed at t=3s, observable until t=303s.
    advance(299_000).await;
    assert!(f.registry.get("1001").is_some());

    advance(1_000).await;
    assert!(f.registry.get("1001").is_none());
    assert_eq!(f.publisher.calls(), 3);
    assert_eq!(f.scheduler.running_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_first_tick_waits_one_interval() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(2))
        .await
        .unwrap();

    advance(1_900).await;
    assert_eq!(f.publisher.calls(), 0);

    advance(200).await;
    assert_eq!(f.publisher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_success_count_is_monotonic_and_bounded() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 4, Duration::from_millis(700))
        .await
        .unwrap();

    let mut last = 0;
    for _ in 0..20 {
        advance(250).await;
        if let Some(job) = f.registry.get("1001") {
            assert!(job.success_count >= last);
            assert!(job.success_count <= job.target_count);
            last = job.success_count;
        }
    }
    assert_eq!(last, 4);
}

#[tokio::test(start_paused = true)]
async fn test_failed_tick_removes_job_immediately() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher {
            fail_on: Some(2),
            ..Default::default()
        },
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap();

    advance(1_500).await;
    assert_eq!(f.registry.get("1001").unwrap().success_count, 1);

    advance(1_000).await;
    assert!(f.registry.get("1001").is_none());
    assert_eq!(f.publisher.calls(), 2);

    // No further ticks once the job is gone.
    advance(10_000).await;
    assert_eq!(f.publisher.calls(), 2);
    assert_eq!(f.scheduler.running_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_job_retained_when_configured() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher {
            fail_on: Some(2),
            ..Default::default()
        },
        SchedulerSettings {
            observation_window: Duration::from_secs(60),
            retain_failed: true,
            ..Default::default()
        },
    );
    f.scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap();

    advance(2_500).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.success_count, 1);
    assert!(job.last_error.unwrap().contains("500"));

    advance(60_000).await;
    assert!(f.registry.get("1001").is_none());
    assert_eq!(f.publisher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stuck_write_dropped_after_grace() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher {
            hang: true,
            ..Default::default()
        },
        SchedulerSettings {
            write_grace: Duration::from_secs(2),
            ..Default::default()
        },
    );
    f.scheduler
        .start("sb=abc", URL, 2, Duration::from_secs(5))
        .await
        .unwrap();

    // Deadline at t=10s, the write started at t=5s may run until t=12s.
    advance(11_500).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.status, JobStatus::Active);
    assert_eq!(f.publisher.calls(), 1);

    advance(1_000).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.status, JobStatus::Expired);
    assert_eq!(job.success_count, 0);
    assert_eq!(f.publisher.calls(), 1);

    // Observable until t=312s.
    advance(299_000).await;
    assert!(f.registry.get("1001").is_some());

    advance(1_000).await;
    assert!(f.registry.get("1001").is_none());
    assert_eq!(f.publisher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_job_with_write_latency_reaches_target() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher {
            delay: Some(Duration::from_millis(50)),
            ..Default::default()
        },
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap();

    // The last write starts exactly at the deadline and lands after it.
    advance(3_010).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.status, JobStatus::Active);
    assert_eq!(job.success_count, 2);

    advance(990).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.success_count, 3);
    assert_eq!(job.success_count, job.target_count);
    assert_eq!(f.publisher.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_tick_due_with_deadline_still_counts() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 2, Duration::from_secs(5))
        .await
        .unwrap();

    advance(10_500).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.success_count, 2);
    assert_eq!(job.status, JobStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn test_slow_writes_never_overlap() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher {
            delay: Some(Duration::from_millis(1_500)),
            ..Default::default()
        },
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 10, Duration::from_secs(1))
        .await
        .unwrap();

    advance(12_000).await;
    assert_eq!(f.publisher.max_in_flight.load(Ordering::SeqCst), 1);

    // Every write that started before the deadline is counted, none after.
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.status, JobStatus::Expired);
    assert!(job.success_count < 10);
    assert_eq!(job.success_count as usize, f.publisher.calls());
}

#[tokio::test(start_paused = true)]
async fn test_resolution_failure_leaves_registry_unchanged() {
    let f = fixture(
        FakeResolver::new(None, Some("token")),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    let before = f.registry.len();

    let err = f
        .scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Resolution(ref url) if url == URL));
    assert_eq!(f.registry.len(), before);
    assert_eq!(f.resolver.token_calls.load(Ordering::SeqCst), 0);

    advance(5_000).await;
    assert_eq!(f.publisher.calls(), 0);
    assert_eq!(f.scheduler.running_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_leaves_registry_unchanged() {
    let f = fixture(
        FakeResolver::new(Some("1001"), None),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );

    let err = f
        .scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::Auth));
    assert!(f.registry.is_empty());
    assert_eq!(f.resolver.resolve_calls.load(Ordering::SeqCst), 1);

    advance(5_000).await;
    assert_eq!(f.publisher.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_requests_rejected_before_resolution() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );

    let err = f
        .scheduler
        .start("sb=abc", URL, 0, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidRequest(_)));

    let err = f
        .scheduler
        .start("sb=abc", URL, 3, Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, SchedulerError::InvalidRequest(_)));

    assert_eq!(f.resolver.resolve_calls.load(Ordering::SeqCst), 0);
    assert!(f.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_jobs_for_same_target_get_distinct_ids() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );

    let first = f
        .scheduler
        .start("sb=abc", URL, 2, Duration::from_secs(1))
        .await
        .unwrap();
    let second = f
        .scheduler
        .start("sb=def", URL, 5, Duration::from_secs(1))
        .await
        .unwrap();

    assert_eq!(first.job_id(), "1001");
    assert_ne!(first.job_id(), second.job_id());
    assert!(second.job_id().starts_with("1001_"));
    assert_eq!(f.registry.len(), 2);
    assert_eq!(f.scheduler.running_jobs(), 2);

    advance(2_500).await;
    assert_eq!(f.registry.get(first.job_id()).unwrap().status, JobStatus::Completed);
    assert_eq!(f.registry.get(second.job_id()).unwrap().success_count, 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_is_idempotent_and_final() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    let handle = f
        .scheduler
        .start("sb=abc", URL, 5, Duration::from_secs(1))
        .await
        .unwrap();

    advance(1_500).await;
    assert_eq!(f.publisher.calls(), 1);

    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());

    advance(10).await;
    assert!(f.registry.get("1001").is_none());

    advance(10_000).await;
    assert_eq!(f.publisher.calls(), 1);
    assert_eq!(f.scheduler.running_jobs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_by_id() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    f.scheduler
        .start("sb=abc", URL, 5, Duration::from_secs(1))
        .await
        .unwrap();

    assert!(!f.scheduler.stop("unknown"));
    assert!(f.scheduler.stop("1001"));

    advance(10).await;
    assert!(f.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_observation_window_removes_entry() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    let handle = f
        .scheduler
        .start("sb=abc", URL, 1, Duration::from_secs(1))
        .await
        .unwrap();

    advance(1_500).await;
    assert_eq!(f.registry.get("1001").unwrap().status, JobStatus::Completed);

    handle.stop();
    advance(10).await;
    assert!(f.registry.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_every_job() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher::default(),
        SchedulerSettings::default(),
    );
    for _ in 0..3 {
        f.scheduler
            .start("sb=abc", URL, 5, Duration::from_secs(1))
            .await
            .unwrap();
    }
    assert_eq!(f.registry.len(), 3);

    f.scheduler.shutdown();
    advance(10).await;
    assert!(f.registry.is_empty());
    assert_eq!(f.scheduler.running_jobs(), 0);

    advance(5_000).await;
    assert_eq!(f.publisher.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stale_task_does_not_remove_reused_id() {
    let f = fixture(
        FakeResolver::ok(),
        ScriptedPublisher {
            fail_on: Some(1),
            ..Default::default()
        },
        SchedulerSettings::default(),
    );

    // First job fails on its first tick and frees the id.
    f.scheduler
        .start("sb=abc", URL, 1, Duration::from_secs(1))
        .await
        .unwrap();
    advance(1_500).await;
    assert!(f.registry.is_empty());

    // A new job takes the same id; nothing left over from the first may touch it.
    let second = f
        .scheduler
        .start("sb=abc", URL, 3, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(second.job_id(), "1001");

    advance(3_500).await;
    let job = f.registry.get("1001").unwrap();
    assert_eq!(job.instance_id, second.instance_id());
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.success_count, 3);
}
