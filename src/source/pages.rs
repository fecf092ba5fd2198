//! Forward-only pagination over the engagement collection.

use tracing::{debug, info};

use super::client::SourceClient;
use super::error::SourceError;
use super::types::EngagementBatch;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Next(String),
    Exhausted,
}

/// Lazy, finite sequence of engagement pages.
///
/// Each call to [`next_page`](Self::next_page) performs one request. The
/// sequence cannot be rewound; start a new generator to walk it again.
#[derive(Debug)]
pub struct PageGenerator<'a> {
    client: &'a SourceClient,
    cursor: Cursor,
    pages_fetched: usize,
}

impl<'a> PageGenerator<'a> {
    /// Creates a generator positioned before the first page.
    #[must_use]
    pub fn new(client: &'a SourceClient) -> Self {
        Self {
            client,
            cursor: Cursor::Start,
            pages_fetched: 0,
        }
    }

    /// Number of pages fetched so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page, or returns `None` once the cursor is exhausted.
    ///
    /// A page whose continuation key is missing or blank is still returned;
    /// the following call ends the sequence. Records that fail to decode are
    /// reported in [`EngagementBatch::malformed`] rather than failing the page.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the page request fails. The cursor is left
    /// unchanged so the caller may decide whether to stop.
    pub async fn next_page(&mut self) -> Result<Option<EngagementBatch>, SourceError> {
        let key = match &self.cursor {
            Cursor::Exhausted => return Ok(None),
            Cursor::Start => None,
            Cursor::Next(key) => Some(key.as_str()),
        };

        let page = self.client.fetch_page(key).await?;
        self.pages_fetched += 1;

        self.cursor = match normalize_key(page.continuation_key.as_deref()) {
            Some(next) => Cursor::Next(next),
            None => {
                debug!(pages = self.pages_fetched, "continuation key exhausted");
                Cursor::Exhausted
            }
        };
        let batch = page.into_batch();
        info!(
            page = self.pages_fetched,
            records = batch.len(),
            malformed = batch.malformed.len(),
            has_more = self.cursor != Cursor::Exhausted,
            "loaded engagement page"
        );

        Ok(Some(batch))
    }
}

/// Treats absent and whitespace-only keys as the end of the collection.
fn normalize_key(key: Option<&str>) -> Option<String> {
    key.map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(ToString::to_string)
}
