//! Bounded retry envelope with exponential backoff.
//!
//! Wraps a single asynchronous operation: failures classified as retryable
//! are retried up to a configured budget with a deterministic backoff
//! schedule; everything else short-circuits immediately. The wrapped
//! operation runs at most `max_retries + 1` times.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

/// Classification hook consumed by [`with_retry`]
pub trait Retryable {
    /// Whether another attempt could plausibly succeed
    fn is_retryable(&self) -> bool;
}

/// Retry policy configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt
    pub max_retries: u32,

    /// Base delay for exponential backoff
    pub base_delay: Duration,

    /// Cap applied to the backoff delay
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Successful outcome with the number of attempts consumed
#[derive(Debug, Clone)]
pub struct Retried<T> {
    pub value: T,
    pub attempts: u32,
}

/// Final failure carrying the root cause and the attempt count
#[derive(thiserror::Error, Debug)]
#[error("{operation} failed after {attempts} attempt(s): {error}")]
pub struct RetryError<E: Display + std::fmt::Debug> {
    pub operation: String,
    pub error: E,
    pub attempts: u32,
}

/// Execute `op`, retrying retryable failures with exponential backoff.
///
/// Non-retryable failures return immediately without consuming retry budget.
/// The delay schedule is `base * 2^n` capped at `max_delay`, with no jitter,
/// so tests under a paused clock can assert exact timings.
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut op: F,
) -> Result<Retried<T>, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display + std::fmt::Debug,
{
    let mut attempts = 0;

    loop {
        attempts += 1;

        match op().await {
            Ok(value) => return Ok(Retried { value, attempts }),
            Err(error) if error.is_retryable() && attempts <= config.max_retries => {
                let delay = backoff_delay(config, attempts - 1);

                tracing::warn!(
                    operation = %operation,
                    attempt = attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Operation failed, retrying: {}",
                    error
                );

                sleep(delay).await;
            }
            Err(error) => {
                return Err(RetryError {
                    operation: operation.to_string(),
                    error,
                    attempts,
                })
            }
        }
    }
}

/// Backoff delay before retry number `attempt` (zero-based)
fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    let base_ms = config.base_delay.as_millis() as u64;
    let exp_ms = base_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(exp_ms.min(config.max_delay.as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(thiserror::Error, Debug)]
    enum TestError {
        #[error("transient")]
        Transient,
        #[error("permanent")]
        Permanent,
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Transient)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default();

        let result = with_retry(&config, "flaky", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(42u32)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result.value, 42);
        assert_eq!(result.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_short_circuits() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::default();

        let err = with_retry(&config, "doomed", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(TestError::Permanent) }
        })
        .await
        .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("doomed"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_bounds_invocations() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig {
            max_retries: 3,
            ..RetryConfig::default()
        };

        let err = with_retry(&config, "always-transient", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<u32, _>(TestError::Transient) }
        })
        .await
        .unwrap_err();

        // max_retries + 1 invocations, never more
        assert_eq!(err.attempts, 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_backoff_delay_schedule() {
        let config = RetryConfig {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        };

        assert_eq!(backoff_delay(&config, 0), Duration::from_millis(500));
        assert_eq!(backoff_delay(&config, 1), Duration::from_millis(1000));
        assert_eq!(backoff_delay(&config, 2), Duration::from_millis(2000));
        // capped at max_delay
        assert_eq!(backoff_delay(&config, 10), Duration::from_secs(10));
    }
}
