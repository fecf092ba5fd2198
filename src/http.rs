//! Shared HTTP client construction for the source and destination APIs.

use std::time::Duration;

use reqwest::Client;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes without any bytes arriving).
///
/// Applies between reads, not to the whole transfer, so a large recording
/// that keeps streaming is never cut off.
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Project URL for User-Agent identification (RFC 9308).
const PROJECT_UA_URL: &str = "https://github.com/fierce/call-migrator";

/// User-Agent identifying this tool on every request.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("call-migrator/{version} (+{PROJECT_UA_URL})")
}

/// Builds a reqwest client with the default timeouts.
///
/// # Errors
///
/// Returns the reqwest builder error if the TLS backend cannot initialize.
pub fn build_client() -> Result<Client, reqwest::Error> {
    build_client_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
}

/// Builds a reqwest client with explicit timeout values.
///
/// There is no total request deadline; `read_timeout_secs` bounds how long
/// the connection may stay idle.
///
/// # Errors
///
/// Returns the reqwest builder error if the TLS backend cannot initialize.
pub fn build_client_with_timeouts(
    connect_timeout_secs: u64,
    read_timeout_secs: u64,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .read_timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(default_user_agent())
        .build()
}

/// Joins a path onto a base URL, tolerating a trailing slash on the base.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_contains_version() {
        let ua = default_user_agent();
        assert!(ua.starts_with(&format!("call-migrator/{}", env!("CARGO_PKG_VERSION"))));
        assert!(ua.contains(PROJECT_UA_URL));
    }

    #[test]
    fn test_join_url_handles_slashes() {
        assert_eq!(join_url("https://a.io/", "/v2/calls"), "https://a.io/v2/calls");
        assert_eq!(join_url("https://a.io", "v2/calls"), "https://a.io/v2/calls");
    }
}
