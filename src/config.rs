//! Runtime configuration loaded from the environment.
//!
//! Tokens, endpoints and the session cookie list are read from environment
//! variables (optionally seeded from a `.env` file by the binary). Each phase
//! only loads what it needs, so a download run does not require destination
//! credentials and vice versa.

use std::env;

use thiserror::Error;

use crate::source::{Session, SessionPool};

/// Default source collection endpoint.
pub const DEFAULT_SOURCE_API_URL: &str = "https://chorus.ai/v3/engagements/";

/// Default destination API base URL.
pub const DEFAULT_DEST_API_URL: &str = "https://api.gong.io/";

/// Provenance tag attached to every migrated call unless overridden.
pub const DEFAULT_MIGRATION_TAG: &str = "Migrated by call-migrator";

/// Fatal setup errors. These abort the run before any item is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is unset or empty.
    #[error("missing required configuration `{name}`")]
    Missing {
        /// Environment variable name.
        name: &'static str,
    },

    /// A variable is present but cannot be interpreted.
    #[error("invalid configuration `{name}`: {reason}")]
    Invalid {
        /// Environment variable name.
        name: &'static str,
        /// What was wrong with the value.
        reason: String,
    },

    /// The session cookie list parsed to zero entries.
    #[error("session pool is empty: DOWNLOAD_SESSION_COOKIES must list at least one session")]
    EmptySessionPool,

    /// The destination directory is not loaded, or loaded with no users.
    #[error("user mapping not loaded: destination user directory is empty or was never fetched")]
    UserIndexNotLoaded,
}

impl ConfigError {
    fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            name,
            reason: reason.into(),
        }
    }
}

/// Settings for the download phase.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Token sent as the `Authorization` header on list requests.
    pub api_token: String,
    /// Engagement collection endpoint.
    pub api_url: String,
    /// Base URL of the `video/{id}` and `wav/{id}` media endpoints.
    pub media_url: String,
    /// One entry per concurrent download stream.
    pub sessions: SessionPool,
}

impl SourceConfig {
    /// Loads the download settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the download settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = required(&lookup, "SOURCE_API_TOKEN")?;
        let api_url = optional(&lookup, "SOURCE_API_URL")
            .unwrap_or_else(|| DEFAULT_SOURCE_API_URL.to_string());
        let media_url = required(&lookup, "SOURCE_MEDIA_URL")?;
        validate_url("SOURCE_API_URL", &api_url)?;
        validate_url("SOURCE_MEDIA_URL", &media_url)?;

        let raw_sessions = required(&lookup, "DOWNLOAD_SESSION_COOKIES")?;
        let sessions = parse_session_list(&raw_sessions)?;

        Ok(Self {
            api_token,
            api_url,
            media_url,
            sessions,
        })
    }
}

/// Settings for the upload phase.
#[derive(Debug, Clone)]
pub struct DestinationConfig {
    /// Token sent as `Authorization: Basic {token}`.
    pub api_token: String,
    /// API base URL (the `/v2/...` paths are joined onto it).
    pub api_url: String,
    /// Workspace every migrated call is filed under.
    pub workspace_id: String,
    /// Owner assigned when a source email has no destination account.
    pub default_owner_id: String,
    /// Free-form provenance tag stored in the call's custom data.
    pub migration_tag: String,
}

impl DestinationConfig {
    /// Loads the upload settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads the upload settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required variable is missing or malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_token = required(&lookup, "DEST_API_TOKEN")?;
        let api_url =
            optional(&lookup, "DEST_API_URL").unwrap_or_else(|| DEFAULT_DEST_API_URL.to_string());
        validate_url("DEST_API_URL", &api_url)?;

        Ok(Self {
            api_token,
            api_url,
            workspace_id: required(&lookup, "DEST_WORKSPACE_ID")?,
            default_owner_id: required(&lookup, "DEST_DEFAULT_OWNER_ID")?,
            migration_tag: optional(&lookup, "MIGRATION_TAG")
                .unwrap_or_else(|| DEFAULT_MIGRATION_TAG.to_string()),
        })
    }
}

/// Parses the `DOWNLOAD_SESSION_COOKIES` value: a JSON array of strings.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] for anything but a string array and
/// [`ConfigError::EmptySessionPool`] when no non-blank entry remains.
pub fn parse_session_list(raw: &str) -> Result<SessionPool, ConfigError> {
    let entries: Vec<String> = serde_json::from_str(raw)
        .map_err(|e| ConfigError::invalid("DOWNLOAD_SESSION_COOKIES", e.to_string()))?;
    let sessions: Vec<Session> = entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .map(Session::new)
        .collect();
    SessionPool::new(sessions)
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, name).ok_or(ConfigError::Missing { name })
}

fn optional<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn validate_url(name: &'static str, value: &str) -> Result<(), ConfigError> {
    url::Url::parse(value)
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(name, e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_source_config_loads_defaults() {
        let config = SourceConfig::from_lookup(lookup_from(&[
            ("SOURCE_API_TOKEN", "tok"),
            ("SOURCE_MEDIA_URL", "https://media.example.com"),
            ("DOWNLOAD_SESSION_COOKIES", r#"["a=1", "b=2"]"#),
        ]))
        .unwrap();

        assert_eq!(config.api_url, DEFAULT_SOURCE_API_URL);
        assert_eq!(config.sessions.len(), 2);
    }

    #[test]
    fn test_source_config_missing_token() {
        let err = SourceConfig::from_lookup(lookup_from(&[
            ("SOURCE_MEDIA_URL", "https://media.example.com"),
            ("DOWNLOAD_SESSION_COOKIES", r#"["a=1"]"#),
        ]))
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Missing {
                name: "SOURCE_API_TOKEN"
            }
        ));
    }

    #[test]
    fn test_blank_variable_counts_as_missing() {
        let err = DestinationConfig::from_lookup(lookup_from(&[
            ("DEST_API_TOKEN", "   "),
            ("DEST_WORKSPACE_ID", "ws"),
            ("DEST_DEFAULT_OWNER_ID", "42"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("DEST_API_TOKEN"));
    }

    #[test]
    fn test_destination_config_rejects_bad_url() {
        let err = DestinationConfig::from_lookup(lookup_from(&[
            ("DEST_API_TOKEN", "tok"),
            ("DEST_API_URL", "not a url"),
            ("DEST_WORKSPACE_ID", "ws"),
            ("DEST_DEFAULT_OWNER_ID", "42"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid { name: "DEST_API_URL", .. }));
    }

    #[test]
    fn test_destination_config_default_tag() {
        let config = DestinationConfig::from_lookup(lookup_from(&[
            ("DEST_API_TOKEN", "tok"),
            ("DEST_WORKSPACE_ID", "ws"),
            ("DEST_DEFAULT_OWNER_ID", "42"),
        ]))
        .unwrap();

        assert_eq!(config.migration_tag, DEFAULT_MIGRATION_TAG);
        assert_eq!(config.api_url, DEFAULT_DEST_API_URL);
    }

    #[test]
    fn test_parse_session_list_rejects_non_array() {
        let err = parse_session_list("a=1,b=2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_parse_session_list_drops_blank_entries() {
        let pool = parse_session_list(r#"["a=1", "  ", "b=2"]"#).unwrap();
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_parse_session_list_empty_is_error() {
        let err = parse_session_list("[]").unwrap_err();
        assert!(matches!(err, ConfigError::EmptySessionPool));
    }
}
