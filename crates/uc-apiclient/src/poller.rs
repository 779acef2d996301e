use std::time::Duration;

use uc_model::Config;

use crate::backoff::ExponentialBackoff;
use crate::error::ApiError;

/// Builds the backoff schedule for poll/push retries from [`Config`],
/// clamped so the smallest retry interval never exceeds the base interval
/// that drives successful polling -- otherwise a degenerate configuration
/// would retry faster under failure than it polls under success.
pub fn poll_backoff(config: &Config, base_interval_seconds: u64) -> ExponentialBackoff {
    let floor = config.clamped_retry_poll_interval(base_interval_seconds);
    ExponentialBackoff::new(
        Duration::from_secs(floor),
        Duration::from_secs(base_interval_seconds.max(floor)),
        config.retry_poll_count,
    )
}

/// Runs one API call under backoff. A terminal error (the server has
/// already moved on, e.g. an aborted deployment) short-circuits
/// immediately instead of burning the retry budget on it; any other
/// failure resets to the next backoff step. Success at any point resets
/// the caller's notion of backoff (there is nothing left to reset here --
/// the schedule is rebuilt fresh on the next call).
pub async fn call_with_backoff<F, Fut, T>(
    config: &Config,
    base_interval_seconds: u64,
    mut attempt: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ApiError>>,
{
    let mut backoff = poll_backoff(config, base_interval_seconds);
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_terminal() => return Err(err),
            Err(err) => match backoff.next() {
                Some(wait) => tokio::time::sleep(wait).await,
                None => return Err(err),
            },
        }
    }
}
