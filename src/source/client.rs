//! Client for the source engagement collection endpoint.

use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use tracing::{debug, instrument};

use super::error::SourceError;
use super::types::EngagementPage;

/// Authenticated access to the engagement listing.
///
/// Cheap to clone; the inner reqwest client shares its connection pool.
#[derive(Debug, Clone)]
pub struct SourceClient {
    client: Client,
    api_url: String,
    api_token: String,
}

impl SourceClient {
    /// Creates a client for `api_url`, authenticating with `api_token`.
    #[must_use]
    pub fn new(client: Client, api_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_token: api_token.into(),
        }
    }

    /// Fetches one page. `continuation_key` is omitted on the first request.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on network failure, non-2xx status or an
    /// undecodable body.
    #[instrument(skip(self), fields(url = %self.api_url, first = continuation_key.is_none()))]
    pub async fn fetch_page(
        &self,
        continuation_key: Option<&str>,
    ) -> Result<EngagementPage, SourceError> {
        let mut request = self
            .client
            .get(&self.api_url)
            .header(AUTHORIZATION, &self.api_token);
        if let Some(key) = continuation_key {
            request = request.query(&[("continuation_key", key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SourceError::network(&self.api_url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::http_status(&self.api_url, status.as_u16()));
        }

        let page: EngagementPage = response
            .json()
            .await
            .map_err(|e| SourceError::decode(&self.api_url, e))?;
        debug!(
            records = page.engagements.len(),
            next_key = ?page.continuation_key,
            "fetched engagement page"
        );
        Ok(page)
    }
}
