use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Method;

use crate::client::HttpTransport;
use crate::error::TransportError;

#[derive(Debug, Clone, Copy)]
pub struct ResumeConfig {
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_attempts: u32,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self { initial_backoff: Duration::from_secs(1), max_backoff: Duration::from_secs(60), max_attempts: 10 }
    }
}

/// Component C: wraps the transport to transparently resume a partial GET
/// using `Range` requests with capped exponential backoff. The caller sees
/// one logical response even though many HTTP transactions may underlie it.
pub struct Resumer<'a> {
    transport: &'a HttpTransport,
    cfg: ResumeConfig,
}

impl<'a> Resumer<'a> {
    pub fn new(transport: &'a HttpTransport, cfg: ResumeConfig) -> Self {
        Self { transport, cfg }
    }

    /// Streams `url`'s body into `on_chunk`, retrying transparently on
    /// mid-stream disconnects. `on_chunk` is called with consecutive,
    /// non-overlapping byte ranges in order.
    pub async fn download<F>(&self, url: &str, mut on_chunk: F) -> Result<(), TransportError>
    where
        F: FnMut(&[u8]) -> Result<(), TransportError>,
    {
        let first = self.transport.send(Method::GET, url, |b| b).await?;
        let status = first.status();
        if !status.is_success() {
            return Err(TransportError::UnexpectedStatus(status.as_u16()));
        }

        let content_length = first.content_length();
        if content_length == Some(0) {
            // Nothing to resume; the body handler fires immediately with an
            // empty body.
            return Ok(());
        }

        let mut offset: u64 = 0;
        let mut resp = first;
        let mut attempt: u32 = 0;
        let mut backoff = self.cfg.initial_backoff;

        loop {
            let mut stream = resp.bytes_stream();
            let mut disconnected = false;
            loop {
                match stream.next().await {
                    Some(Ok(chunk)) => {
                        on_chunk(&chunk)?;
                        offset += chunk.len() as u64;
                    }
                    Some(Err(_)) => {
                        disconnected = true;
                        break;
                    }
                    None => break,
                }
            }

            let done = match content_length {
                Some(total) => offset >= total,
                None => !disconnected,
            };
            if done {
                return Ok(());
            }

            attempt += 1;
            if attempt > self.cfg.max_attempts {
                return Err(TransportError::RetryBudgetExhausted { attempts: attempt - 1 });
            }
            tokio::time::sleep(backoff).await;
            backoff = (backoff * 2).min(self.cfg.max_backoff);

            // §4.C step 3 / §8 scenario 5 specify the closed form
            // `bytes=<offset>-<content_length-1>`, not an open-ended range.
            let range_header = match content_length {
                Some(total) => format!("bytes={}-{}", offset, total - 1),
                None => format!("bytes={}-", offset),
            };
            let retried = self
                .transport
                .send(Method::GET, url, move |b| b.header(reqwest::header::RANGE, range_header.clone()))
                .await?;

            if retried.status().as_u16() != 206 {
                // The server either doesn't support resuming this
                // particular transfer, or replied 200 without range
                // support; either way this is not resumable.
                return Err(TransportError::UnexpectedStatus(retried.status().as_u16()));
            }
            let content_range = retried
                .headers()
                .get(reqwest::header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| TransportError::MalformedContentRange("missing".into()))?;
            let (start, end, total) = parse_content_range(content_range)
                .ok_or_else(|| TransportError::MalformedContentRange(content_range.to_string()))?;
            if start != offset {
                return Err(TransportError::ResumeOffsetMismatch { expected: offset, actual: start });
            }
            if let Some(expected_total) = content_length {
                if end != expected_total - 1 {
                    return Err(TransportError::MalformedContentRange(content_range.to_string()));
                }
                if let Some(actual_total) = total {
                    if actual_total != expected_total {
                        return Err(TransportError::MalformedContentRange(content_range.to_string()));
                    }
                }
            }

            resp = retried;
        }
    }
}

/// Parses a single, non-multipart `Content-Range: bytes <start>-<end>/<total>`
/// header into `(start, end, total)`, `total` being `None` for the `*`
/// (unknown total) form. Anything else -- multiple ranges, a unit other
/// than `bytes`, a negative or malformed range -- is rejected by returning
/// `None`, which the caller surfaces as a permanent download failure.
fn parse_content_range(header: &str) -> Option<(u64, u64, Option<u64>)> {
    let rest = header.strip_prefix("bytes ")?;
    let (range, total) = rest.split_once('/')?;
    let (start, end) = range.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end: u64 = end.trim().parse().ok()?;
    if end < start {
        return None;
    }
    let total = match total.trim() {
        "*" => None,
        digits => Some(digits.parse().ok()?),
    };
    Some((start, end, total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_content_range() {
        assert_eq!(parse_content_range("bytes 247913-1234566/1234567"), Some((247913, 1234566, Some(1234567))));
    }

    #[test]
    fn parses_an_unknown_total() {
        assert_eq!(parse_content_range("bytes 100-199/*"), Some((100, 199, None)));
    }

    #[test]
    fn rejects_malformed_ranges() {
        assert_eq!(parse_content_range("garbage"), None);
        assert_eq!(parse_content_range("bytes 200-100/300"), None);
        assert_eq!(parse_content_range("items 0-1/2"), None);
    }
}
