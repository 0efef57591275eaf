//! Retry, backoff, and timeout wrappers for provider calls.
//!
//! Every outbound provider call in the gas station goes through this layer:
//! exponential backoff between attempts, a hard cap on attempt count, and a
//! per-call timeout. Errors the caller classifies as non-retryable (e.g.
//! HTTP 400/401/403/404) fail immediately without further attempts.

use std::future::Future;
use std::time::Duration;

/// Classifies whether an error is worth another attempt.
pub trait Retryable {
    /// Returns `true` if a retry could plausibly succeed.
    fn is_retryable(&self) -> bool;
}

/// Retry schedule: exponential backoff with a cap.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first (minimum 1).
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles each retry.
    pub base_delay: Duration,
    /// Upper bound on any single backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    fn delay_for(&self, completed_attempts: u32) -> Duration {
        let factor = 2_u32.saturating_pow(completed_attempts.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Failure of a retried operation.
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The error was classified non-retryable and returned immediately.
    #[error("non-retryable: {0}")]
    NonRetryable(E),
    /// All attempts failed; carries the last error.
    #[error("gave up after {attempts} attempt(s): {source}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// The final error.
        source: E,
    },
}

impl<E> RetryError<E> {
    /// Returns the underlying error, however the retry loop ended.
    pub fn into_inner(self) -> E {
        match self {
            Self::NonRetryable(e) | Self::Exhausted { source: e, .. } => e,
        }
    }
}

/// Runs `op` until it succeeds, the error is non-retryable, or the policy's
/// attempt budget is exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    mut op: F,
) -> Result<T, RetryError<E>>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if !e.is_retryable() => return Err(RetryError::NonRetryable(e)),
            Err(e) if attempt >= max_attempts => {
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: e,
                });
            }
            Err(e) => {
                let delay = policy.delay_for(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, error = %e, "retrying after backoff");
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// The wrapped future did not complete within its deadline.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
#[error("operation timed out after {0:?}")]
pub struct TimeoutError(pub Duration);

/// Bounds a future with a deadline, mapping the elapsed timer to a typed
/// error.
pub async fn with_timeout<T, Fut>(duration: Duration, fut: Fut) -> Result<T, TimeoutError>
where
    Fut: Future<Output = T>,
{
    tokio::time::timeout(duration, fut)
        .await
        .map_err(|_| TimeoutError(duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, thiserror::Error)]
    #[error("fake error (retryable: {retryable})")]
    struct FakeError {
        retryable: bool,
    }

    impl Retryable for FakeError {
        fn is_retryable(&self) -> bool {
            self.retryable
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, FakeError>(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError { retryable: false }) }
        })
        .await;
        assert!(matches!(result.unwrap_err(), RetryError::NonRetryable(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(fast_policy(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FakeError { retryable: true }) }
        })
        .await;
        assert!(matches!(
            result.unwrap_err(),
            RetryError::Exhausted { attempts: 3, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_recovers_on_later_attempt() {
        let calls = AtomicU32::new(0);
        let result = retry_with_backoff(fast_policy(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 1 {
                    Err(FakeError { retryable: true })
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(300),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(300));
        assert_eq!(policy.delay_for(4), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_with_timeout_elapses() {
        let result =
            with_timeout(Duration::from_millis(5), tokio::time::sleep(Duration::from_secs(5)))
                .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_with_timeout_passes_value() {
        let result = with_timeout(Duration::from_secs(1), async { 42 }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
