//! Retry policy for transient remote reads within a single run.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::domain::GitwatchError;

/// Retry policy for transient failures (timeouts, 429, 5xx).
///
/// Only errors classified `Transient` are retried; everything else fails the
/// run immediately and the next tick re-queries the same window.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Base delay for the first retry.
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff.
    pub multiplier: f64,
}

impl RetryPolicy {
    /// 3 attempts, 1s, 2s.
    pub fn standard() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
        }
    }

    /// Single attempt, never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before the next attempt: base_delay * multiplier^(attempts - 1)
    ///
    /// `attempts` is the number of attempts already made (1-indexed).
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let base_secs = self.base_delay.as_secs_f64();
        let delay_secs = base_secs * self.multiplier.powi(attempts.saturating_sub(1) as i32);
        Duration::from_secs_f64(delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, GitwatchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GitwatchError>>,
{
    let mut attempts = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempts < policy.max_attempts => {
                let delay = policy.next_delay(attempts);
                warn!(
                    operation,
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempts += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
