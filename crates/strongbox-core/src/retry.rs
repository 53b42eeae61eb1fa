//! Bounded retry of transient storage errors.
//!
//! The store runs on a single SQLite connection, so a busy or locked database
//! is usually another process holding the file. Those errors are retried with
//! capped exponential backoff; everything else (constraint violations,
//! malformed SQL, decode failures) is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use strongbox_types::config::RetryConfig;
use strongbox_types::error::RepositoryError;

/// How many times, and how patiently, to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Run once, never retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Retry without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before the retry following failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let base_ms = duration_to_u64_ms(self.base_delay);
        let max_ms = duration_to_u64_ms(self.max_delay);
        Duration::from_millis(base_ms.saturating_mul(1_u64 << shift).min(max_ms))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
        }
    }
}

fn duration_to_u64_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Run `op`, retrying transient errors according to `policy`.
///
/// When the attempts run out on a transient error, the result is
/// [`RepositoryError::RetriesExhausted`] naming `operation`.
pub async fn retry_transient<T, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, RepositoryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RepositoryError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                if attempt >= max_attempts {
                    return Err(RepositoryError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last: err.to_string(),
                    });
                }
                let delay = policy.delay_for(attempt);
                tracing::debug!(
                    operation,
                    attempt,
                    delay_ms = duration_to_u64_ms(delay),
                    "transient storage error, retrying: {err}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delay_is_exponential_and_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(10));
        assert_eq!(policy.delay_for(2), Duration::from_millis(20));
        assert_eq!(policy.delay_for(3), Duration::from_millis(40));
        assert_eq!(policy.delay_for(5), Duration::from_millis(100));
        assert_eq!(policy.delay_for(40), Duration::from_millis(100));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(RetryConfig {
            max_attempts: 3,
            base_delay_ms: 5,
            max_delay_ms: 50,
        });
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_retries_busy_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_transient("store meta", &RetryPolicy::immediate(5), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(RepositoryError::Busy("database is locked".into()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> =
            retry_transient("store meta", &RetryPolicy::immediate(5), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RepositoryError::Query("UNIQUE constraint failed".into()))
            })
            .await;

        assert!(matches!(result, Err(RepositoryError::Query(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_names_operation() {
        let result: Result<(), _> =
            retry_transient("read meta 'token'", &RetryPolicy::immediate(3), || async {
                Err(RepositoryError::Busy("database is locked".into()))
            })
            .await;

        match result {
            Err(RepositoryError::RetriesExhausted {
                operation,
                attempts,
                ..
            }) => {
                assert_eq!(operation, "read meta 'token'");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {other:?}"),
        }
    }
}
