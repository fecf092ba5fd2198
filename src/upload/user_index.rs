//! Destination user directory, keyed by email.

use std::collections::HashMap;

use tracing::{debug, info, instrument, warn};

use super::client::DestinationClient;
use super::error::UploadError;
use crate::config::ConfigError;

/// Email → destination user id mapping.
///
/// Built once per upload run by [`load`](Self::load) and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct UserIndex {
    users: HashMap<String, String>,
}

impl UserIndex {
    /// Creates an empty, not yet loaded index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from known pairs.
    #[must_use]
    pub fn from_pairs<I, E, U>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (E, U)>,
        E: Into<String>,
        U: Into<String>,
    {
        let users = pairs
            .into_iter()
            .map(|(email, id)| (normalize_email(&email.into()), id.into()))
            .collect();
        Self { users }
    }

    /// Walks every page of the destination user listing.
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadError`] from the listing; a partial index is
    /// never kept. A directory without a single usable email is
    /// [`ConfigError::UserIndexNotLoaded`].
    #[instrument(skip_all)]
    pub async fn load(client: &DestinationClient) -> Result<Self, UploadError> {
        let mut users = HashMap::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = client.list_users(cursor.as_deref()).await?;
            for user in page.users {
                match user.email_address {
                    Some(email) if !email.trim().is_empty() => {
                        users.insert(normalize_email(&email), user.id);
                    }
                    _ => debug!(user_id = %user.id, "user without email ignored"),
                }
            }
            info!(
                page = ?page.records.current_page_number,
                users = users.len(),
                "loaded user page"
            );

            cursor = page
                .records
                .cursor
                .map(|next| next.trim().to_string())
                .filter(|next| !next.is_empty());
            if cursor.is_none() {
                break;
            }
        }

        if users.is_empty() {
            return Err(ConfigError::UserIndexNotLoaded.into());
        }
        info!(total = users.len(), "user directory loaded");
        Ok(Self { users })
    }

    /// Number of known users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether no user has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Looks up an email, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserIndexNotLoaded`] if the index is empty: a
    /// lookup against an unloaded directory is a setup bug, not a miss.
    pub fn lookup(&self, email: &str) -> Result<Option<&str>, ConfigError> {
        if self.users.is_empty() {
            return Err(ConfigError::UserIndexNotLoaded);
        }
        Ok(self.users.get(&normalize_email(email)).map(String::as_str))
    }

    /// Resolves an email to a user id, falling back to `default_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UserIndexNotLoaded`] if the index is empty.
    pub fn resolve_or<'a>(
        &'a self,
        email: &str,
        default_id: &'a str,
    ) -> Result<&'a str, ConfigError> {
        match self.lookup(email)? {
            Some(id) => {
                debug!(email, user_id = id, "matched user");
                Ok(id)
            }
            None => {
                warn!(email, default_id, "no destination user for email, using default owner");
                Ok(default_id)
            }
        }
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_before_load_fails_fast() {
        let index = UserIndex::new();
        assert!(matches!(
            index.lookup("a@x.com"),
            Err(ConfigError::UserIndexNotLoaded)
        ));
        assert!(index.resolve_or("a@x.com", "default").is_err());
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let index = UserIndex::from_pairs([("A@X.com", "1")]);
        assert_eq!(index.lookup(" a@x.COM ").unwrap(), Some("1"));
    }

    #[test]
    fn test_resolve_or_falls_back_to_default() {
        let index = UserIndex::from_pairs([("a@x.com", "1")]);
        assert_eq!(index.resolve_or("a@x.com", "default").unwrap(), "1");
        assert_eq!(index.resolve_or("b@x.com", "default").unwrap(), "default");
    }
}
