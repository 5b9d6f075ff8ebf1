//! Retry policy for failed wallet scans.
//!
//! Implements exponential backoff with configurable parameters. Sleeping goes
//! through the [`Sleeper`] trait so tests can observe the delays without
//! waiting for them.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::discovery::DiscoveryError;

/// Upper bound for a single backoff delay
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Something that can wait
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real timer-backed sleeper
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt before giving up.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Delay before retry number `retry_count` (0-based).
    ///
    /// `base_delay * multiplier^retry_count`, capped at [`MAX_BACKOFF`].
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let factor = self.multiplier.max(1.0).powi(exponent);
        let secs = (self.base_delay.as_secs_f64() * factor).min(MAX_BACKOFF.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Check if an error should be retried given the retries already made.
    pub fn should_retry(&self, error: &DiscoveryError, retry_count: u32) -> bool {
        error.is_retryable() && retry_count < self.max_retries
    }

    /// Run `operation` until it succeeds, fails permanently or retries run out.
    ///
    /// `on_retry` is told the new retry count before each backoff sleep.
    /// Cancellation interrupts the sleep and ends the run with
    /// [`DiscoveryError::Cancelled`].
    pub async fn run<T, F, Fut>(
        &self,
        sleeper: &dyn Sleeper,
        cancel: &CancellationToken,
        mut operation: F,
        mut on_retry: impl FnMut(u32, &DiscoveryError),
    ) -> Result<T, DiscoveryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DiscoveryError>>,
    {
        let mut retry_count = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(DiscoveryError::Cancelled);
            }

            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !self.should_retry(&error, retry_count) {
                return Err(error);
            }

            let delay = self.backoff(retry_count);
            retry_count += 1;
            on_retry(retry_count, &error);
            tracing::warn!(
                target: "catalog::retry",
                retry = retry_count,
                max = self.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Scan failed, retrying: {}",
                error
            );

            tokio::select! {
                _ = sleeper.sleep(delay) => {}
                _ = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }
}

/// Sleeper that records delays and returns immediately.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: parking_lot::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.multiplier, 2.0);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::default();
        // 1s * 2^n
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_capping() {
        let policy = RetryPolicy {
            max_retries: 50,
            base_delay: Duration::from_secs(60),
            multiplier: 2.0,
        };
        assert_eq!(policy.backoff(2), Duration::from_secs(240));
        assert_eq!(policy.backoff(3), MAX_BACKOFF);
        assert_eq!(policy.backoff(40), MAX_BACKOFF);
    }

    #[test]
    fn test_shrinking_multiplier_is_clamped() {
        let policy = RetryPolicy {
            multiplier: 0.5,
            ..Default::default()
        };
        assert_eq!(policy.backoff(3), Duration::from_secs(1));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();
        let network = DiscoveryError::Network("reset".into());
        assert!(policy.should_retry(&network, 0));
        assert!(policy.should_retry(&network, 2));
        assert!(!policy.should_retry(&network, 3));
        assert!(!policy.should_retry(&DiscoveryError::Cancelled, 0));
    }

    #[tokio::test]
    async fn test_run_succeeds_after_failures() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let attempts = &AtomicU32::new(0);
        let mut retries_seen = Vec::new();

        let result = policy
            .run(
                &sleeper,
                &CancellationToken::new(),
                move || async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(DiscoveryError::Network("flaky".into()))
                    } else {
                        Ok("tracks")
                    }
                },
                |n, _| retries_seen.push(n),
            )
            .await;

        assert_eq!(result, Ok("tracks"));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(retries_seen, vec![1, 2]);
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_run_exhausts_retries() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();
        let attempts = &AtomicU32::new(0);

        let result: Result<(), _> = policy
            .run(
                &sleeper,
                &CancellationToken::new(),
                move || async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(DiscoveryError::RateLimited)
                },
                |_, _| {},
            )
            .await;

        assert_eq!(result, Err(DiscoveryError::RateLimited));
        // first attempt + 3 retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn test_non_retryable_error_stops_immediately() {
        let policy = RetryPolicy::default();
        let sleeper = RecordingSleeper::default();

        let result: Result<(), _> = policy
            .run(
                &sleeper,
                &CancellationToken::new(),
                || async { Err(DiscoveryError::NotConfigured("curated index")) },
                |_, _| {},
            )
            .await;

        assert_eq!(result, Err(DiscoveryError::NotConfigured("curated index")));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), _> = RetryPolicy::default()
            .run(&RecordingSleeper::default(), &cancel, || async { Ok(()) }, |_, _| {})
            .await;
        assert_eq!(result, Err(DiscoveryError::Cancelled));
    }
}
