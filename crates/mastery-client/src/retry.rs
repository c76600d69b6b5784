//! Exponential backoff for transient API failures.
//!
//! Attempts are strictly sequential; there is no cancellation. The wait
//! before attempt `n + 1` is `base_delay * 2^n`, capped at `max_delay`.

use mastery_core::MasteryConfig;
use std::future::Future;
use std::time::Duration;

/// Failure classification: transient errors (rate limiting, server errors,
/// connection problems) are worth retrying, everything else is terminal.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total invocation budget, including the first attempt.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn from_config(config: &MasteryConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: config
                .get_u64("retry.max_attempts")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_attempts),
            base_delay: config
                .get_u64("retry.base_delay_ms")
                .map(Duration::from_millis)
                .unwrap_or(defaults.base_delay),
            max_delay: config
                .get_u64("retry.max_delay_ms")
                .map(Duration::from_millis)
                .unwrap_or(defaults.max_delay),
        }
    }

    pub(crate) fn delay_for(&self, completed_attempts: u32) -> Duration {
        let factor = 1u32 << completed_attempts.min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, the error is terminal, or the attempt budget
/// is exhausted. The last error is returned unchanged so callers can present
/// it directly.
pub async fn with_retry<T, E, F, Fut>(config: RetryConfig, mut op: F) -> std::result::Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                if !err.is_retryable() || attempt >= max_attempts {
                    return Err(err);
                }
                let delay = config.delay_for(attempt - 1);
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, backing off: {}",
                    err
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
