use std::time::Duration;

use uc_apiclient::{call_with_backoff, ApiError, ExponentialBackoff};
use uc_model::Config;

#[test]
fn exponential_backoff_doubles_up_to_cap() {
    let mut backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(8), 5);
    let waits: Vec<_> = std::iter::from_fn(|| backoff.next()).collect();
    assert_eq!(
        waits,
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
            Duration::from_secs(8),
        ]
    );
}

#[test]
fn backoff_is_exhausted_after_max_attempts() {
    let mut backoff = ExponentialBackoff::new(Duration::from_secs(1), Duration::from_secs(8), 2);
    assert!(backoff.next().is_some());
    assert!(backoff.next().is_some());
    assert!(backoff.next().is_none());
}

#[tokio::test]
async fn terminal_error_short_circuits_without_retrying() {
    let config = Config { retry_poll_count: 5, ..Config::default() };
    let mut calls = 0;
    let result: Result<(), ApiError> = call_with_backoff(&config, 300, || {
        calls += 1;
        async { Err(ApiError::DeploymentAborted) }
    })
    .await;
    assert!(matches!(result, Err(ApiError::DeploymentAborted)));
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn transient_error_retries_until_success() {
    let config = Config { retry_poll_count: 5, retry_poll_interval_seconds: 1, ..Config::default() };
    let mut calls = 0;
    let result: Result<u32, ApiError> = call_with_backoff(&config, 300, || {
        calls += 1;
        let attempt = calls;
        async move {
            if attempt < 3 {
                Err(ApiError::ServerError(503))
            } else {
                Ok(attempt)
            }
        }
    })
    .await;
    assert_eq!(result.unwrap(), 3);
}
