//! Bounded retry with exponential backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempts are numbered from 0; the wait after attempt `n` is
/// `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl BackoffPolicy {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("{0}")]
    Permanent(E),
}

/// Run `operation` until it succeeds, fails with an error `is_retryable`
/// rejects, or `policy.max_attempts` attempts have been made. The operation
/// receives the zero-based attempt number. No wait follows the last attempt.
pub async fn with_backoff<T, E, F, Fut, P>(
    policy: &BackoffPolicy,
    mut operation: F,
    is_retryable: P,
) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !is_retryable(&err) => return Err(RetryError::Permanent(err)),
            Err(err) => {
                let made = attempt + 1;
                if made >= max_attempts {
                    return Err(RetryError::Exhausted {
                        attempts: made,
                        last: err,
                    });
                }

                let wait = policy.delay_for_attempt(attempt);
                tracing::warn!(
                    attempt = made,
                    max_attempts,
                    wait_ms = wait.as_millis() as u64,
                    error = %err,
                    "Retryable failure, backing off"
                );
                tokio::time::sleep(wait).await;
                attempt = made;
            }
        }
    }
}
