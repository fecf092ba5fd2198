//! Client for the destination call API.

use std::path::Path;

use reqwest::Client;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::error::UploadError;
use super::retry::send_with_rate_limit_retry;
use crate::http::join_url;

/// Multipart field carrying the media file.
pub const MEDIA_FIELD_NAME: &str = "mediaFile";

/// One participant of a call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Participant email.
    pub email_address: String,
    /// Destination user id.
    pub user_id: String,
}

/// Body of the create-call request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCall {
    /// Call title.
    pub title: String,
    /// Start time, `YYYY-MM-DDTHH:MM:SSZ`.
    pub actual_start: String,
    /// Idempotency key; the destination dedupes on it.
    pub client_unique_id: String,
    /// Provenance tag.
    pub custom_data: String,
    /// Always `Unknown` for migrated calls.
    pub direction: String,
    /// Owner user id.
    pub primary_user: String,
    /// Call participants.
    pub parties: Vec<Party>,
    /// Target workspace.
    pub workspace_id: String,
}

/// Response of the create-call request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedCall {
    /// Server-assigned call id.
    pub call_id: String,
    /// Request id for support tickets.
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Response of the media-attach request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachedMedia {
    /// Call id the media was attached to.
    pub call_id: String,
    /// Request id for support tickets.
    #[serde(default)]
    pub request_id: Option<String>,
    /// Where the call will be viewable once processed.
    #[serde(default)]
    pub url: Option<String>,
}

/// One destination user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationUser {
    /// User id.
    pub id: String,
    /// Login email.
    #[serde(default)]
    pub email_address: Option<String>,
}

/// Paging block of the user listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecords {
    /// Cursor for the next page; absent on the last page.
    #[serde(default)]
    pub cursor: Option<String>,
    /// 0-based page number, for logging.
    #[serde(default)]
    pub current_page_number: Option<u64>,
}

/// One page of the user listing.
#[derive(Debug, Clone, Deserialize)]
pub struct UsersPage {
    /// Paging information.
    #[serde(default)]
    pub records: UserRecords,
    /// Users on this page.
    #[serde(default)]
    pub users: Vec<DestinationUser>,
}

/// Authenticated access to the destination API.
#[derive(Debug, Clone)]
pub struct DestinationClient {
    client: Client,
    base_url: String,
    auth_header: String,
}

impl DestinationClient {
    /// Creates a client for `base_url` using basic auth with `api_token`.
    #[must_use]
    pub fn new(client: Client, base_url: impl Into<String>, api_token: &str) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            auth_header: format!("Basic {api_token}"),
        }
    }

    /// Fetches one page of the user directory.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError`] on network failure, non-2xx status or an
    /// undecodable body.
    #[instrument(skip(self))]
    pub async fn list_users(&self, cursor: Option<&str>) -> Result<UsersPage, UploadError> {
        let url = join_url(&self.base_url, "v2/users");
        let mut request = self
            .client
            .get(&url)
            .header(AUTHORIZATION, &self.auth_header);
        if let Some(cursor) = cursor {
            request = request.query(&[("cursor", cursor)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| UploadError::network(&url, e))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UploadError::http_status(&url, status.as_u16(), &body));
        }
        response
            .json()
            .await
            .map_err(|e| UploadError::decode(&url, e))
    }

    /// Creates a call record, retrying once on a rate limit.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::HttpStatus`] for any rejection (including a
    /// repeated 429), or a network/decode error.
    #[instrument(skip(self, call), fields(title = %call.title, unique_id = %call.client_unique_id))]
    pub async fn create_call(&self, call: &NewCall) -> Result<CreatedCall, UploadError> {
        let url = join_url(&self.base_url, "v2/calls");
        let endpoint = url.as_str();
        let response = send_with_rate_limit_retry("create_call", endpoint, move || {
            let request = self
                .client
                .post(endpoint)
                .header(AUTHORIZATION, &self.auth_header)
                .json(call);
            async move {
                request
                    .send()
                    .await
                    .map_err(|e| UploadError::network(endpoint, e))
            }
        })
        .await?;
        debug!(status = response.status().as_u16(), "create call accepted");

        response
            .json()
            .await
            .map_err(|e| UploadError::decode(&url, e))
    }

    /// Streams `media_path` to the call's media endpoint as multipart form
    /// data, retrying once on a rate limit. The file is reopened for the retry.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Io`] if the file cannot be opened,
    /// [`UploadError::HttpStatus`] for any rejection, or a network/decode error.
    #[instrument(skip(self), fields(path = %media_path.display()))]
    pub async fn upload_media(
        &self,
        call_id: &str,
        media_path: &Path,
        upload_name: &str,
    ) -> Result<AttachedMedia, UploadError> {
        let url = join_url(&self.base_url, &format!("v2/calls/{call_id}/media"));
        let endpoint = url.as_str();
        let response = send_with_rate_limit_retry("upload_media", endpoint, move || async move {
            let form = media_form(media_path, upload_name).await?;
            self.client
                .put(endpoint)
                .header(AUTHORIZATION, &self.auth_header)
                .multipart(form)
                .send()
                .await
                .map_err(|e| UploadError::network(endpoint, e))
        })
        .await?;
        debug!(status = response.status().as_u16(), "media upload accepted");

        response
            .json()
            .await
            .map_err(|e| UploadError::decode(&url, e))
    }
}

async fn media_form(media_path: &Path, upload_name: &str) -> Result<Form, UploadError> {
    let file = tokio::fs::File::open(media_path)
        .await
        .map_err(|e| UploadError::io(media_path, e))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| UploadError::io(media_path, e))?
        .len();
    let part = Part::stream_with_length(file, length).file_name(upload_name.to_string());
    Ok(Form::new().part(MEDIA_FIELD_NAME, part))
}
