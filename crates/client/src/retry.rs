//! Bounded retry with exponential backoff for idempotent reads.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientResult;

/// Retry policy for reads.
///
/// Only errors for which [`ClientError::is_transient`] holds are retried.
/// Cart writes never go through a policy.
///
/// [`ClientError::is_transient`]: crate::ClientError::is_transient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_delay: Duration,
    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// # Errors
    ///
    /// Returns the last error produced by `op`.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> ClientResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ClientResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut delay = self.initial_delay;
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts && e.is_transient() => {
                    tracing::warn!(
                        request = label,
                        attempt,
                        max_attempts = attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Request failed, retrying: {e}"
                    );
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.max_delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
