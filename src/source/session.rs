//! Download session cookies and their rotation.

use std::fmt;

use crate::config::ConfigError;

/// Opaque session cookie authorizing one concurrent media download stream.
///
/// `Debug` is redacted so the credential never reaches the logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    /// Wraps a raw cookie header value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw value sent in the `Cookie` header.
    #[must_use]
    pub fn cookie_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(<redacted>)")
    }
}

/// Fixed, ordered set of sessions loaded at startup.
///
/// Sessions are never added or removed at runtime. [`SessionPool::next`]
/// cycles through them starting with the first entry.
#[derive(Debug, Clone)]
pub struct SessionPool {
    sessions: Vec<Session>,
    index: usize,
}

impl SessionPool {
    /// Builds a pool from an ordered list of sessions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptySessionPool`] if `sessions` is empty.
    pub fn new(sessions: Vec<Session>) -> Result<Self, ConfigError> {
        if sessions.is_empty() {
            return Err(ConfigError::EmptySessionPool);
        }
        Ok(Self { sessions, index: 0 })
    }

    /// Number of sessions, i.e. the number of concurrent download streams.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Always false; an empty pool cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions in pool order.
    #[must_use]
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Returns the next session in cyclic order: 0, 1, ..., N-1, 0, ...
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> &Session {
        let current = self.index;
        self.index = (self.index + 1) % self.sessions.len();
        &self.sessions[current]
    }
}
