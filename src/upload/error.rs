//! Error types for the upload module.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::media_name::MediaNameError;

/// Errors that can occur while migrating one stored file.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The stored file name cannot be turned into call metadata.
    #[error(transparent)]
    InvalidFileName(#[from] MediaNameError),

    /// Setup problem surfaced during an item (e.g. user index not loaded).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error calling {url}: {source}")]
    Network {
        /// The request URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response. A 429 lands here once its single retry is spent.
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Response body, truncated, for the operator's log.
        body: String,
    },

    /// 2xx response whose JSON body did not match the expected shape.
    #[error("malformed response from {url}: {source}")]
    Decode {
        /// The request URL.
        url: String,
        /// The underlying decode error.
        #[source]
        source: reqwest::Error,
    },

    /// The media file could not be opened for streaming.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// The media file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// Upper bound on the response body kept in [`UploadError::HttpStatus`].
const MAX_ERROR_BODY_CHARS: usize = 512;

impl UploadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error, truncating the body.
    pub fn http_status(url: impl Into<String>, status: u16, body: &str) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    /// Creates a decode error.
    pub fn decode(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status of an upstream rejection, if this is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_truncates_body() {
        let body = "x".repeat(2_000);
        let error = UploadError::http_status("https://api.example.com/v2/calls", 400, &body);
        let UploadError::HttpStatus { body, .. } = &error else {
            panic!("expected HttpStatus");
        };
        assert_eq!(body.len(), MAX_ERROR_BODY_CHARS);
        assert_eq!(error.status(), Some(400));
    }

    #[test]
    fn test_invalid_file_name_is_transparent() {
        let error = UploadError::from(MediaNameError::Pattern {
            path: PathBuf::from("output/x/y.mp4"),
        });
        assert!(error.to_string().contains("output/x/y.mp4"));
        assert_eq!(error.status(), None);
    }
}
