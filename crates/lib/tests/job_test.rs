//! # Job Runner Tests
//!
//! Drives `JobRunner` against the in-memory feed and store doubles to check
//! ordering, skipping, per-entry isolation and the (absent) deduplication.

use async_trait::async_trait;
use feedvault::errors::{FeedFetchError, JobError};
use feedvault::ingest::{FeedEntry, FeedSource, JobRunner, JobState};
use feedvault::{JobConfig, RetryPolicy};
use feedvault_test_utils::{entry, setup_tracing, MockStore, StaticFeed, StoreCall};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const FEED_URL: &str = "http://feeds.test/rss.xml";
const STORE_ID: &str = "vs_target";

fn job_config() -> JobConfig {
    JobConfig {
        feed_url: FEED_URL.to_string(),
        vector_store_id: STORE_ID.to_string(),
    }
}

fn fast_retry(max_retries: usize) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(2),
    }
}

fn runner(feed: StaticFeed, store: &MockStore) -> JobRunner {
    runner_with(Box::new(feed), store)
}

fn runner_with(feed: Box<dyn FeedSource>, store: &MockStore) -> JobRunner {
    JobRunner::new(
        feed,
        Box::new(store.clone()),
        Box::new(store.clone()),
        job_config(),
    )
    .with_retry_policy(RetryPolicy::none())
}

fn three_entries_one_empty() -> Vec<FeedEntry> {
    vec![
        entry("First Article", "http://feeds.test/1", "Body one"),
        FeedEntry::new(Some("Empty Article"), Some("http://feeds.test/2")),
        FeedEntry::new(Some("Third Article"), Some("http://feeds.test/3"))
            .with_content("<p>Body three</p>", Some("text/html")),
    ]
}

/// A feed that signals when a fetch starts and holds it until released.
#[derive(Clone)]
struct GatedFeed {
    entries: Vec<FeedEntry>,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl FeedSource for GatedFeed {
    async fn fetch(&self, _feed_url: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.entries.clone())
    }
}

#[tokio::test]
async fn test_uploads_and_attaches_in_feed_order_skipping_empty_entries() {
    // --- Arrange ---
    setup_tracing();
    let store = MockStore::new();
    let feed = StaticFeed::new(three_entries_one_empty());
    let job = runner(feed.clone(), &store);

    // --- Act ---
    let report = job.run_once().await.unwrap();

    // --- Assert ---
    assert_eq!(report.fetched, 3);
    assert_eq!(report.indexed.len(), 2);
    assert_eq!(report.skipped, vec![Some("http://feeds.test/2".to_string())]);
    assert!(report.is_clean());
    assert_eq!(feed.requested_urls(), vec![FEED_URL.to_string()]);

    assert_eq!(
        store.uploads(),
        vec![
            ("First_Article.txt".to_string(), "Body one".to_string()),
            (
                "Third_Article.txt".to_string(),
                "<p>Body three</p>".to_string()
            ),
        ]
    );
    assert_eq!(
        store.attached_filenames(STORE_ID),
        vec!["First_Article.txt", "Third_Article.txt"]
    );
    assert_eq!(report.indexed[0].link.as_deref(), Some("http://feeds.test/1"));
    assert_eq!(report.indexed[1].file_name, "Third_Article.txt");
}

#[tokio::test]
async fn test_every_attach_follows_its_upload() {
    setup_tracing();
    let store = MockStore::new();
    let job = runner(StaticFeed::new(three_entries_one_empty()), &store);

    job.run_once().await.unwrap();

    let calls = store.calls();
    assert_eq!(calls.len(), 4);
    for pair in calls.chunks(2) {
        let StoreCall::Upload { purpose, .. } = &pair[0] else {
            panic!("expected upload, got {:?}", pair[0]);
        };
        assert_eq!(purpose, "assistants");
        let StoreCall::Attach { store_id, file_id } = &pair[1] else {
            panic!("expected attach, got {:?}", pair[1]);
        };
        assert_eq!(store_id, STORE_ID);
        assert!(file_id.starts_with("file-"));
    }
}

#[tokio::test]
async fn test_entries_without_content_never_reach_the_store() {
    setup_tracing();
    let store = MockStore::new();
    let entries = vec![
        FeedEntry::new(Some("A"), Some("http://feeds.test/a")),
        FeedEntry::new(Some("B"), None).with_summary("").with_content("  ", None),
    ];
    let job = runner(StaticFeed::new(entries), &store);

    let report = job.run_once().await.unwrap();

    assert!(report.indexed.is_empty());
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.skipped[1], None);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_running_twice_duplicates_documents() {
    setup_tracing();
    let store = MockStore::new();
    let job = runner(StaticFeed::new(three_entries_one_empty()), &store);

    let first = job.run_once().await.unwrap();
    let second = job.run_once().await.unwrap();

    assert_eq!(first.indexed.len(), 2);
    assert_eq!(second.indexed.len(), 2);
    assert_ne!(first.indexed[0].file_id, second.indexed[0].file_id);
    assert_eq!(store.stored_file_count(), 4);
    assert_eq!(
        store.attached_filenames(STORE_ID),
        vec![
            "First_Article.txt",
            "Third_Article.txt",
            "First_Article.txt",
            "Third_Article.txt"
        ]
    );
}

#[tokio::test]
async fn test_upload_failure_is_isolated_to_its_entry() {
    // --- Arrange ---
    setup_tracing();
    let store = MockStore::new();
    store.fail_upload("First_Article.txt", 400);
    let job = runner(StaticFeed::new(three_entries_one_empty()), &store);

    // --- Act ---
    let report = job.run_once().await.unwrap();

    // --- Assert ---
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].title, "First Article");
    assert_eq!(report.failed[0].orphaned_file_id, None);
    assert!(report.failed[0].error.contains("First_Article.txt"));
    assert_eq!(report.indexed.len(), 1);
    assert_eq!(store.attached_filenames(STORE_ID), vec!["Third_Article.txt"]);
    let attach_calls = store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::Attach { .. }))
        .count();
    assert_eq!(attach_calls, 1);
}

#[tokio::test]
async fn test_attach_failure_reports_orphaned_file() {
    setup_tracing();
    let store = MockStore::new();
    store.fail_attach("First_Article.txt", 400);
    let job = runner(StaticFeed::new(three_entries_one_empty()), &store);

    let report = job.run_once().await.unwrap();

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].orphaned_file_id.as_deref(), Some("file-1"));
    assert_eq!(report.indexed.len(), 1);
    // The orphan stays in storage; nothing deletes it.
    assert_eq!(store.stored_file_count(), 2);
}

#[tokio::test]
async fn test_transient_upload_failures_are_retried() {
    setup_tracing();
    let store = MockStore::new();
    store.fail_upload_times("First_Article.txt", 503, 2);
    let job = runner(StaticFeed::new(three_entries_one_empty()), &store)
        .with_retry_policy(fast_retry(3));

    let report = job.run_once().await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.indexed.len(), 2);
    let first_uploads = store
        .uploads()
        .into_iter()
        .filter(|(name, _)| name == "First_Article.txt")
        .count();
    assert_eq!(first_uploads, 3);
}

#[tokio::test]
async fn test_feed_failure_aborts_the_run() {
    setup_tracing();
    let store = MockStore::new();
    let job = runner(StaticFeed::unreachable("connection refused"), &store);

    let result = job.run_once().await;

    assert!(matches!(result, Err(JobError::FeedFetch(_))));
    assert!(store.calls().is_empty());
    assert_eq!(job.state(), JobState::Idle);
}

#[tokio::test]
async fn test_runner_is_idle_between_runs() {
    setup_tracing();
    let store = MockStore::new();
    let job = runner(StaticFeed::new(vec![]), &store);

    assert_eq!(job.state(), JobState::Idle);
    let report = job.run_once().await.unwrap();
    assert_eq!(report.fetched, 0);
    assert_eq!(job.state(), JobState::Idle);
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_scheduler_runs_immediately_and_stops_on_shutdown() {
    setup_tracing();
    let store = MockStore::new();
    let feed = StaticFeed::new(three_entries_one_empty());
    let job = Arc::new(runner(feed.clone(), &store));

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let scheduled = {
        let job = job.clone();
        tokio::spawn(async move {
            job.run_scheduled(Duration::from_secs(3600), async {
                let _ = rx.await;
            })
            .await;
        })
    };

    // The first tick fires immediately; wait for it to land.
    for _ in 0..100 {
        if store.attached_filenames(STORE_ID).len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tx.send(()).unwrap();
    scheduled.await.unwrap();

    assert_eq!(feed.requested_urls().len(), 1);
    assert_eq!(store.attached_filenames(STORE_ID).len(), 2);
    assert_eq!(job.state(), JobState::Idle);
}

#[tokio::test]
async fn test_overlapping_run_is_refused_while_one_is_in_flight() {
    // --- Arrange ---
    setup_tracing();
    let store = MockStore::new();
    let feed = GatedFeed {
        entries: three_entries_one_empty(),
        entered: Arc::new(Notify::new()),
        release: Arc::new(Notify::new()),
    };
    let job = Arc::new(runner_with(Box::new(feed.clone()), &store));

    let first = {
        let job = job.clone();
        tokio::spawn(async move { job.run_once().await })
    };
    feed.entered.notified().await;

    // --- Act ---
    let overlapping = job.run_once().await;

    // --- Assert ---
    assert!(matches!(overlapping, Err(JobError::AlreadyRunning)));
    assert_eq!(job.state(), JobState::Running);
    assert!(store.calls().is_empty());

    feed.release.notify_one();
    let report = first.await.unwrap().unwrap();
    assert_eq!(report.indexed.len(), 2);
    assert_eq!(job.state(), JobState::Idle);
}
