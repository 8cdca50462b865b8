//! Retry logic with exponential backoff and jitter
//!
//! Persistence writes are independent and retryable. A write that still fails
//! after the configured attempts is dropped for this cycle; the next
//! confidence change reconciles it.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Configuration for retry behavior
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Maximum delay cap
    pub max_delay_ms: u64,
    /// Backoff multiplier (2.0 for exponential)
    pub backoff_factor: f64,
    /// Whether to add jitter to delay
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_delay_ms: 100,
            max_delay_ms: 2_000,
            backoff_factor: 2.0,
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1) as i32;
        let base = self.initial_delay_ms as f64 * self.backoff_factor.powi(exponent);
        let mut delay_ms = base.min(self.max_delay_ms as f64).max(0.0) as u64;
        if self.jitter && delay_ms > 0 {
            delay_ms += rand::thread_rng().gen_range(0..=delay_ms / 4);
        }
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// A write that kept failing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted {
    pub error: StorageError,
    pub attempts: u32,
}

/// Run `operation` until it succeeds, fails permanently, or runs out of retries
pub async fn execute_with_retry<F, Fut, T>(
    mut operation: F,
    config: &RetryConfig,
) -> Result<T, RetryExhausted>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StorageError>>,
{
    let mut attempts = 0;
    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let retries_used = attempts - 1;
                if !error.is_retryable() || retries_used >= config.max_retries {
                    return Err(RetryExhausted { error, attempts });
                }
                let delay = config.delay_for(attempts);
                tracing::debug!(attempt = attempts, ?delay, "retrying failed write: {}", error);
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            backoff_factor: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_delay_grows_and_caps() {
        let config = RetryConfig {
            jitter: false,
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for(1), Duration::from_millis(100));
        assert_eq!(config.delay_for(2), Duration::from_millis(200));
        assert_eq!(config.delay_for(10), Duration::from_millis(2_000));
    }

    #[test]
    fn test_jitter_stays_under_cap() {
        let config = RetryConfig::default();
        for retry in 1..8 {
            assert!(config.delay_for(retry) <= Duration::from_millis(config.max_delay_ms));
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = execute_with_retry(
            || async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StorageError::Unavailable("blip".into()))
                } else {
                    Ok(7)
                }
            },
            &quick(2),
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = execute_with_retry(
            || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StorageError::WriteFailed("down".into()))
            },
            &quick(2),
        )
        .await;
        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = execute_with_retry(
            || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(StorageError::NotFound("t1".into()))
            },
            &quick(5),
        )
        .await;
        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
