//! Stored media filename contract.
//!
//! A downloaded recording is stored as
//! `{output}/{owner}/{timestamp} {title}.{format}` where `timestamp` is an
//! ISO-8601 UTC instant with millisecond precision, so a lexical sort of a
//! user directory is a chronological sort. The filename is the only record
//! of the engagement kept on disk: the upload phase recovers the owner,
//! start time, title and format from it through [`MediaFileName::parse_path`].
//!
//! Both halves of the contract live here so they cannot drift apart.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use thiserror::Error;

/// Timestamp layout used in stored filenames.
const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Timestamp layout expected by the destination API (no sub-second part).
const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Title used when the source record has none.
const UNTITLED: &str = "Untitled";

/// Stored filename pattern. Accepts both `22:13:20` and the filesystem-safe
/// `221320` time forms.
#[allow(clippy::expect_used)]
static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?P<timestamp>\d{4}-\d{2}-\d{2}T\d{2}:?\d{2}:?\d{2}(?:\.\d+)?Z)",
        r"\s(?P<title>.*)\.(?P<format>[^.\s]+)$",
    ))
    .expect("stored filename regex is valid") // Static pattern, safe to panic
});

/// A stored filename that does not follow the layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaNameError {
    /// The path has no `{owner}/{file}` shape or the owner is not an email.
    #[error("path does not match `{{owner email}}/{{timestamp}} {{title}}.{{format}}`: {path}")]
    Pattern {
        /// The offending path.
        path: PathBuf,
    },

    /// The timestamp part matched the pattern but is not a real instant.
    #[error("invalid timestamp `{value}` in {path}")]
    Timestamp {
        /// The offending path.
        path: PathBuf,
        /// The raw timestamp text.
        value: String,
    },
}

/// Components of a stored media filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFileName {
    /// Owner directory (the owner's email address).
    pub owner: String,
    /// Engagement start time.
    pub timestamp: DateTime<Utc>,
    /// Sanitized title.
    pub title: String,
    /// File extension without the dot.
    pub format: String,
}

impl MediaFileName {
    /// Builds the components for a new download. The title is sanitized.
    #[must_use]
    pub fn new(
        owner: impl Into<String>,
        timestamp: DateTime<Utc>,
        title: &str,
        format: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            timestamp,
            title: sanitize_title(title),
            format: format.into(),
        }
    }

    /// File name without directories, e.g. `2023-11-14T22:13:20.000Z Sync.m4a`.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!(
            "{} {}.{}",
            self.timestamp.format(FILE_TIMESTAMP_FORMAT),
            self.title,
            self.format
        )
    }

    /// Owner-relative key `{owner}/{file name}`, stable across output roots.
    #[must_use]
    pub fn relative_key(&self) -> String {
        format!("{}/{}", self.owner, self.file_name())
    }

    /// Full path under `output_dir`.
    #[must_use]
    pub fn path_in(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.owner).join(self.file_name())
    }

    /// Start time in the destination API layout, e.g. `2023-11-14T22:13:20Z`.
    #[must_use]
    pub fn actual_start(&self) -> String {
        self.timestamp.format(API_TIMESTAMP_FORMAT).to_string()
    }

    /// Recovers the components from a stored path.
    ///
    /// Only the last two path components are inspected, so absolute and
    /// relative paths under any output root are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`MediaNameError`] if the path does not follow the layout.
    pub fn parse_path(path: &Path) -> Result<Self, MediaNameError> {
        let pattern_error = || MediaNameError::Pattern {
            path: path.to_path_buf(),
        };

        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(pattern_error)?;
        let owner = path
            .parent()
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .filter(|owner| owner.contains('@'))
            .ok_or_else(pattern_error)?;

        let normalized = normalize_file_name(file_name);
        let captures = FILE_NAME_PATTERN
            .captures(&normalized)
            .ok_or_else(pattern_error)?;
        let raw_timestamp = &captures["timestamp"];
        let timestamp =
            parse_file_timestamp(raw_timestamp).ok_or_else(|| MediaNameError::Timestamp {
                path: path.to_path_buf(),
                value: raw_timestamp.to_string(),
            })?;
        let title = captures["title"].trim();

        Ok(Self {
            owner: owner.to_string(),
            timestamp,
            title: if title.is_empty() {
                UNTITLED.to_string()
            } else {
                title.to_string()
            },
            format: captures["format"].to_string(),
        })
    }
}

/// Converts source epoch seconds to a UTC instant.
#[must_use]
pub fn timestamp_from_epoch(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Makes a title safe for use inside a filename.
///
/// Path separators and characters invalid on common filesystems become `_`,
/// whitespace runs collapse to a single space, and an empty result becomes
/// `Untitled`.
#[must_use]
pub fn sanitize_title(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() && !c.is_whitespace() => '_',
            c => c,
        })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let trimmed = collapsed.trim_matches('.').trim();
    if trimmed.is_empty() {
        UNTITLED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Collapses repeated spaces and drops a space right before the extension.
fn normalize_file_name(file_name: &str) -> String {
    let collapsed = file_name
        .split(' ')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    match collapsed.rfind('.') {
        Some(dot) if collapsed[..dot].ends_with(' ') => {
            format!("{}{}", collapsed[..dot].trim_end(), &collapsed[dot..])
        }
        _ => collapsed,
    }
}

fn parse_file_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    ["%Y-%m-%dT%H:%M:%S%.fZ", "%Y-%m-%dT%H%M%S%.fZ"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .map(|naive| naive.and_utc())
}
