use crate::retry::{Retryable, RetryConfig, with_retry};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

#[derive(Debug, PartialEq)]
struct FakeError {
    status: u16,
}

impl std::fmt::Display for FakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}", self.status)
    }
}

impl Retryable for FakeError {
    fn is_retryable(&self) -> bool {
        self.status == 429 || (500..=599).contains(&self.status)
    }
}

fn config(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(30),
    }
}

#[tokio::test(start_paused = true)]
async fn exhaustion_invokes_the_operation_exactly_max_attempts_times() {
    let calls = AtomicU32::new(0);
    let result: Result<(), FakeError> = with_retry(config(3), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(FakeError { status: 429 }) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.unwrap_err(), FakeError { status: 429 });
}

#[tokio::test(start_paused = true)]
async fn non_retryable_errors_reject_immediately_without_backoff() {
    let start = tokio::time::Instant::now();
    let calls = AtomicU32::new(0);
    let result: Result<(), FakeError> = with_retry(config(3), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(FakeError { status: 400 }) }
    })
    .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.unwrap_err(), FakeError { status: 400 });
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn success_on_first_attempt_does_not_retry() {
    let calls = AtomicU32::new(0);
    let result: Result<u32, FakeError> = with_retry(config(3), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Ok(7) }
    })
    .await;

    assert_eq!(result.unwrap(), 7);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn transient_failures_recover_and_back_off_exponentially() {
    let start = tokio::time::Instant::now();
    let calls = AtomicU32::new(0);
    let result: Result<u32, FakeError> = with_retry(config(5), || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                Err(FakeError { status: 503 })
            } else {
                Ok(42)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 1s after the first failure, 2s after the second.
    assert_eq!(start.elapsed(), Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn a_zero_attempt_budget_still_runs_once() {
    let calls = AtomicU32::new(0);
    let result: Result<(), FakeError> = with_retry(config(0), || {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err(FakeError { status: 429 }) }
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn backoff_delays_double_and_cap() {
    let cfg = RetryConfig {
        max_attempts: 10,
        base_delay: Duration::from_secs(1),
        max_delay: Duration::from_secs(4),
    };
    assert_eq!(cfg.delay_for(0), Duration::from_secs(1));
    assert_eq!(cfg.delay_for(1), Duration::from_secs(2));
    assert_eq!(cfg.delay_for(2), Duration::from_secs(4));
    assert_eq!(cfg.delay_for(3), Duration::from_secs(4));
}

#[test]
fn retry_config_reads_engine_config() {
    let mut config = mastery_core::MasteryConfig::default_engine();
    config.set_value("retry.max_attempts", serde_json::json!(5));
    config.set_value("retry.base_delay_ms", serde_json::json!(250));
    let retry = RetryConfig::from_config(&config);
    assert_eq!(retry.max_attempts, 5);
    assert_eq!(retry.base_delay, Duration::from_millis(250));
    assert_eq!(retry.max_delay, Duration::from_millis(30000));
}
