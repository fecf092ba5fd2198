//! Error types for the download module.
//!
//! Every variant carries the context (engagement id, url, path) needed to
//! re-run a single failed item by hand.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while downloading one engagement.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The record is missing a field required to build the request or path.
    /// No network call is made.
    #[error("invalid engagement {id:?}: {reason}")]
    InvalidInput {
        /// The engagement id (may be empty).
        id: String,
        /// Which field was missing or malformed.
        reason: &'static str,
    },

    /// The server answered with an HTML page instead of media, which almost
    /// always means the session cookie expired.
    #[error("unexpected content type `{content_type}` downloading {url} (session expired?)")]
    BadContent {
        /// The media URL.
        url: String,
        /// The rejected `Content-Type` value.
        content_type: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error during download (create directory, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an invalid input error.
    pub fn invalid_input(id: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidInput {
            id: id.into(),
            reason,
        }
    }

    /// Creates a bad content error.
    pub fn bad_content(url: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::BadContent {
            url: url.into(),
            content_type: content_type.into(),
        }
    }

    /// Creates a network error from a reqwest error, promoting timeouts.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            return Self::Timeout { url: url.into() };
        }
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

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

// No From<reqwest::Error> / From<std::io::Error>: every variant needs the
// url or path the source error does not carry.
