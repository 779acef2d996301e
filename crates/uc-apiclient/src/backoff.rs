//! Retry/backoff primitives. On failure the poller and status-push calls
//! switch to exponential backoff with a retry count; on any success the
//! backoff resets. The smallest interval is clamped so it never exceeds the
//! configured base poll interval.

use std::time::Duration;

/// An iterator of successive wait durations, doubling each step up to a
/// cap, bounded by a maximum number of attempts.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    next: Duration,
    cap: Duration,
    remaining: u32,
}

impl ExponentialBackoff {
    pub fn new(base: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self { next: base, cap, remaining: max_attempts }
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        let current = self.next;
        self.next = (self.next * 2).min(self.cap);
        Some(current)
    }
}

/// Runs `attempt` until it succeeds or `backoff` is exhausted, sleeping
/// between attempts. Returns the last error if the budget runs out.
pub async fn retry_with_backoff<F, Fut, T, E>(mut backoff: ExponentialBackoff, mut attempt: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) => match backoff.next() {
                Some(wait) => tokio::time::sleep(wait).await,
                None => return Err(err),
            },
        }
    }
}
