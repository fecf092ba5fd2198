//! Errors raised while listing engagements.

use thiserror::Error;

/// Failure fetching or decoding an engagement page.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network-level error (DNS, connection refused, TLS, timeout).
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response from the collection endpoint.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Response body was not a valid engagement page.
    #[error("malformed engagement page from {url}: {source}")]
    Decode {
        /// The URL whose body failed to decode.
        url: String,
        /// The underlying reqwest decode error.
        #[source]
        source: reqwest::Error,
    },
}

impl SourceError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let error = SourceError::http_status("https://api.example.com/v3/engagements", 401);
        let msg = error.to_string();
        assert!(msg.contains("401"), "Expected status in: {msg}");
        assert!(msg.contains("engagements"), "Expected URL in: {msg}");
    }
}
