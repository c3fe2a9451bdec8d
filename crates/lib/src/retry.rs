//! Bounded retry for remote store calls.

use crate::errors::StoreError;
use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Exponential backoff settings for upload and attach calls.
///
/// Only errors for which [`StoreError::is_transient`] holds are retried. Since the
/// store offers no idempotency key, a retried upload may leave a duplicate file
/// behind: delivery is at-least-once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(max_retries: usize) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::with_max_retries(0)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }

    /// Runs `operation`, retrying transient failures with exponential backoff.
    pub async fn run<T, F, Fut>(&self, label: &str, operation: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        operation
            .retry(self.backoff())
            .sleep(tokio::time::sleep)
            .when(StoreError::is_transient)
            .notify(|err: &StoreError, delay: Duration| {
                warn!(
                    operation = label,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying store request"
                );
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(max_retries: usize) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn api(status: u16) -> StoreError {
        StoreError::Api {
            status,
            body: "boom".to_string(),
        }
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result = fast(3)
            .run("upload", || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(api(503))
                } else {
                    Ok("file-1")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "file-1");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_fail_immediately() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: Result<(), _> = fast(3)
            .run("attach", || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(api(400))
            })
            .await;

        assert!(matches!(result, Err(StoreError::Api { status: 400, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let counter = AtomicUsize::new(0);
        let attempts = &counter;
        let result: Result<(), _> = fast(2)
            .run("upload", || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(api(429))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }
}
