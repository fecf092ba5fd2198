//! Single-retry handling for destination rate limits (HTTP 429).
//!
//! A 429 carrying a `Retry-After` header is retried exactly once after the
//! server-specified delay. Anything else that is not 2xx, including a second
//! 429, is returned to the caller as [`UploadError::HttpStatus`].

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::RETRY_AFTER;
use tracing::{info, instrument, warn};

use super::error::UploadError;

/// Delay used when `Retry-After` is present but not a positive integer.
pub const FALLBACK_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Maximum Retry-After value (1 hour) to prevent excessive delays.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Parses a `Retry-After` value given in whole seconds.
///
/// Non-numeric, zero and negative values fall back to one second; values
/// above one hour are capped.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use migrator_core::upload::parse_retry_after;
///
/// assert_eq!(parse_retry_after("3"), Duration::from_secs(3));
/// assert_eq!(parse_retry_after("soon"), Duration::from_secs(1));
/// ```
#[must_use]
pub fn parse_retry_after(header_value: &str) -> Duration {
    match header_value.trim().parse::<u64>() {
        Ok(0) | Err(_) => FALLBACK_RETRY_AFTER,
        Ok(seconds) => {
            let delay = Duration::from_secs(seconds);
            if delay > MAX_RETRY_AFTER {
                warn!(
                    seconds,
                    max_seconds = MAX_RETRY_AFTER.as_secs(),
                    "Retry-After exceeds maximum, capping at 1 hour"
                );
                return MAX_RETRY_AFTER;
            }
            delay
        }
    }
}

/// Delay requested by a 429 response, or `None` if the response is not a
/// retryable rate limit (any other status, or a 429 without `Retry-After`).
fn rate_limit_delay(response: &reqwest::Response) -> Option<Duration> {
    if response.status() != StatusCode::TOO_MANY_REQUESTS {
        return None;
    }
    let header = response.headers().get(RETRY_AFTER)?;
    Some(parse_retry_after(header.to_str().unwrap_or_default()))
}

/// Sends a request, retrying once after the server delay on a 429.
///
/// `send` is called once, or twice when rate limited, and must build a fresh
/// request on each call.
///
/// # Errors
///
/// Returns the error from `send`, or [`UploadError::HttpStatus`] when the
/// final response is not 2xx.
#[instrument(skip(send))]
pub(crate) async fn send_with_rate_limit_retry<F, Fut>(
    operation: &str,
    url: &str,
    mut send: F,
) -> Result<reqwest::Response, UploadError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<reqwest::Response, UploadError>>,
{
    let response = send().await?;

    let response = match rate_limit_delay(&response) {
        Some(delay) => {
            info!(wait_secs = delay.as_secs(), "received 429, waiting before retry");
            tokio::time::sleep(delay).await;
            info!("retrying");
            send().await?
        }
        None => response,
    };

    ensure_success(url, response).await
}

async fn ensure_success(
    url: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), body = %body, "request rejected");
    Err(UploadError::http_status(url, status.as_u16(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_retry_after_seconds() {
        assert_eq!(parse_retry_after("3"), Duration::from_secs(3));
        assert_eq!(parse_retry_after(" 120 "), Duration::from_secs(120));
    }

    #[test]
    fn test_parse_retry_after_fallbacks() {
        assert_eq!(parse_retry_after("0"), FALLBACK_RETRY_AFTER);
        assert_eq!(parse_retry_after("-5"), FALLBACK_RETRY_AFTER);
        assert_eq!(parse_retry_after("later"), FALLBACK_RETRY_AFTER);
        assert_eq!(
            parse_retry_after("Wed, 21 Oct 2025 07:28:00 GMT"),
            FALLBACK_RETRY_AFTER
        );
    }

    #[test]
    fn test_parse_retry_after_caps_at_one_hour() {
        assert_eq!(parse_retry_after("86400"), MAX_RETRY_AFTER);
    }
}
