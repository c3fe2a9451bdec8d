//! # Job Runner
//!
//! Fetches the configured feed and, entry by entry in feed order, extracts the
//! text, uploads it and attaches it to the target vector store.
//!
//! A failed upload or attach is recorded and logged, and the run moves on to the
//! next entry. Only a feed that cannot be fetched or parsed aborts a run. Nothing
//! is deduplicated: running twice over an unchanged feed uploads every entry twice.

use crate::config::JobConfig;
use crate::errors::JobError;
use crate::ingest::attach::attach_document;
use crate::ingest::extract::extract_content;
use crate::ingest::traits::FeedSource;
use crate::ingest::types::{DocumentPayload, EntryFailure, FeedEntry, IndexedDocument};
use crate::ingest::upload::upload_document;
use crate::providers::store::{DocumentStorage, IndexService};
use crate::retry::RetryPolicy;
use chrono::{DateTime, SecondsFormat, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
}

/// Outcome of a single job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Number of entries the feed yielded.
    pub fetched: usize,
    /// Uploaded and attached entries, in feed order.
    pub indexed: Vec<IndexedDocument>,
    /// Links of entries skipped for lack of content, in feed order.
    pub skipped: Vec<Option<String>>,
    pub failed: Vec<EntryFailure>,
}

impl JobReport {
    /// True when no entry failed.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Orchestrates one feed against one vector store.
///
/// All collaborators are injected, and live as long as the runner does.
pub struct JobRunner {
    feed: Box<dyn FeedSource>,
    storage: Box<dyn DocumentStorage>,
    index: Box<dyn IndexService>,
    config: JobConfig,
    retry: RetryPolicy,
    running: AtomicBool,
}

/// Flips the runner back to idle however the run ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl JobRunner {
    pub fn new(
        feed: Box<dyn FeedSource>,
        storage: Box<dyn DocumentStorage>,
        index: Box<dyn IndexService>,
        config: JobConfig,
    ) -> Self {
        Self {
            feed,
            storage,
            index,
            config,
            retry: RetryPolicy::default(),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> JobState {
        if self.running.load(Ordering::Acquire) {
            JobState::Running
        } else {
            JobState::Idle
        }
    }

    /// Performs one complete pass over the feed.
    ///
    /// Returns [`JobError::AlreadyRunning`] if another run on this runner has not
    /// finished yet.
    pub async fn run_once(&self) -> Result<JobReport, JobError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::AlreadyRunning);
        }
        let _guard = RunningGuard(&self.running);

        let started_at = Utc::now();
        info!("Job started at {}", timestamp(&started_at));

        let entries = self.feed.fetch(&self.config.feed_url).await.map_err(|e| {
            error!("Failed to fetch feed {}: {e}", self.config.feed_url);
            JobError::from(e)
        })?;
        info!("Fetched {} entries from RSS feed.", entries.len());

        let mut indexed = Vec::new();
        let mut skipped = Vec::new();
        let mut failed = Vec::new();

        for entry in &entries {
            let Some(text) = extract_content(entry) else {
                warn!("Skipping entry with no content: {}", entry.display_link());
                skipped.push(entry.link.clone());
                continue;
            };

            match self.process_entry(entry, text).await {
                Ok(document) => indexed.push(document),
                Err(err) => {
                    error!("Failed to index entry {}: {err}", entry.display_link());
                    let orphaned_file_id = match &err {
                        JobError::Attach { file_id, .. } => Some(file_id.clone()),
                        _ => None,
                    };
                    failed.push(EntryFailure {
                        link: entry.link.clone(),
                        title: entry.title.clone(),
                        orphaned_file_id,
                        error: err.to_string(),
                    });
                }
            }
        }

        let finished_at = Utc::now();
        info!(
            indexed = indexed.len(),
            skipped = skipped.len(),
            failed = failed.len(),
            "Job finished at {}",
            timestamp(&finished_at)
        );

        Ok(JobReport {
            started_at,
            finished_at,
            fetched: entries.len(),
            indexed,
            skipped,
            failed,
        })
    }

    /// Uploads one entry's text and attaches it; attach only runs after a successful upload.
    async fn process_entry(
        &self,
        entry: &FeedEntry,
        text: &str,
    ) -> Result<IndexedDocument, JobError> {
        let payload = DocumentPayload::new(&entry.title, text);

        let document = upload_document(self.storage.as_ref(), &payload, &self.retry)
            .await
            .map_err(|source| JobError::Upload {
                file_name: payload.file_name.clone(),
                source,
            })?;

        attach_document(
            self.index.as_ref(),
            &document.file_id,
            &self.config.vector_store_id,
            &self.retry,
        )
        .await
        .map_err(|source| JobError::Attach {
            file_id: document.file_id.clone(),
            store_id: self.config.vector_store_id.clone(),
            source,
        })?;

        Ok(IndexedDocument {
            link: entry.link.clone(),
            file_name: document.file_name,
            file_id: document.file_id,
        })
    }

    /// Runs the job immediately and then once per `period`, until `shutdown` resolves.
    ///
    /// A run in progress is allowed to finish before shutdown takes effect. Ticks
    /// missed while a slow run was in flight are dropped rather than replayed.
    pub async fn run_scheduled<F>(&self, period: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(
            "Scheduling job every {}s for feed {}",
            period.as_secs(),
            self.config.feed_url
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping scheduler.");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run_once().await {
                        Ok(report) if !report.is_clean() => warn!(
                            "Job run completed with {} failed entries",
                            report.failed.len()
                        ),
                        Ok(_) => {}
                        Err(JobError::AlreadyRunning) => {
                            warn!("Previous job run still in progress, skipping this trigger.")
                        }
                        Err(err) => error!("Job run failed: {err}"),
                    }
                }
            }
        }
    }
}
