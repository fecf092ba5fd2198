//! Single-engagement media download.

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::DownloadError;
use crate::media_name::{MediaFileName, timestamp_from_epoch};
use crate::source::{Engagement, MediaKind, Session};

/// Content type of the login/error page served when a session is rejected.
const HTML_CONTENT_TYPE: &str = "text/html";

/// Result of a successful [`MediaDownloader::download_engagement`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The media was written to `path`.
    Downloaded {
        /// Final file path.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
    },
    /// The target already existed and skip-existing is enabled.
    Skipped {
        /// Existing file path.
        path: PathBuf,
    },
}

/// Downloads engagement media into `{output_dir}/{owner}/`.
///
/// Cheap to clone; the inner reqwest client shares its connection pool.
#[derive(Debug, Clone)]
pub struct MediaDownloader {
    client: Client,
    media_url: String,
    output_dir: PathBuf,
    skip_existing: bool,
}

impl MediaDownloader {
    /// Creates a downloader for the media endpoints under `media_url`.
    #[must_use]
    pub fn new(
        client: Client,
        media_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            media_url: media_url.into(),
            output_dir: output_dir.into(),
            skip_existing: false,
        }
    }

    /// When enabled, an existing target file short-circuits the download.
    ///
    /// Disabled by default: an existing file is reported and downloaded again.
    #[must_use]
    pub fn with_skip_existing(mut self, skip_existing: bool) -> Self {
        self.skip_existing = skip_existing;
        self
    }

    /// Root directory that holds one sub-directory per owner.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Downloads the media of one engagement using `session` for auth.
    ///
    /// The body is streamed to a `.part` file next to the target and renamed
    /// into place once flushed, so a failed or rejected download never
    /// leaves a truncated file behind and never clobbers an existing one.
    ///
    /// # Errors
    ///
    /// - [`DownloadError::InvalidInput`] if the record lacks an id, owner or
    ///   valid timestamp (no request is made)
    /// - [`DownloadError::BadContent`] if the server returns `text/html`
    /// - [`DownloadError::HttpStatus`], [`DownloadError::Network`],
    ///   [`DownloadError::Timeout`] for upstream failures
    /// - [`DownloadError::Io`] if the file cannot be written
    #[instrument(
        skip(self, engagement, session),
        fields(id = %engagement.id, owner = %engagement.user)
    )]
    pub async fn download_engagement(
        &self,
        engagement: &Engagement,
        session: &Session,
    ) -> Result<DownloadOutcome, DownloadError> {
        let id = engagement.id.trim();
        if id.is_empty() {
            return Err(DownloadError::invalid_input(id, "missing id"));
        }
        let owner = engagement.user.trim();
        if !is_valid_owner(owner) {
            return Err(DownloadError::invalid_input(id, "missing or invalid owner"));
        }
        let timestamp = engagement
            .date_time
            .and_then(timestamp_from_epoch)
            .ok_or_else(|| DownloadError::invalid_input(id, "missing or out-of-range date_time"))?;

        let kind = engagement.engagement_type.media_kind();
        let url = media_url(&self.media_url, kind, id)?;
        let name = MediaFileName::new(
            owner,
            timestamp,
            engagement.subject.as_deref().unwrap_or_default(),
            kind.extension(),
        );

        let user_dir = ensure_user_directory(&self.output_dir, owner).await?;
        let target = user_dir.join(name.file_name());

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            if self.skip_existing {
                info!(path = %target.display(), "file exists, skipping");
                return Ok(DownloadOutcome::Skipped { path: target });
            }
            warn!(path = %target.display(), "file exists, downloading again");
        }

        debug!(url = %url, path = %target.display(), "starting download");
        let response = self
            .client
            .get(&url)
            .header(COOKIE, session.cookie_value())
            .send()
            .await
            .map_err(|e| DownloadError::network(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(&url, status.as_u16()));
        }

        if let Some(content_type) = rejected_content_type(&response) {
            return Err(DownloadError::bad_content(&url, content_type));
        }

        let part_path = partial_path(&target);
        let bytes = match write_part_file(response, &url, &part_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %part_path.display(), "cleaning up partial file after error");
                let _ = tokio::fs::remove_file(&part_path).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part_path, &target).await {
            let _ = tokio::fs::remove_file(&part_path).await;
            return Err(DownloadError::io(target, e));
        }

        info!(path = %target.display(), bytes, "download complete");
        Ok(DownloadOutcome::Downloaded {
            path: target,
            bytes,
        })
    }
}

/// Resolves `{output_dir}/{owner}`, creating it if needed.
///
/// # Errors
///
/// Returns [`DownloadError::Io`] if the directory cannot be created.
pub async fn ensure_user_directory(
    output_dir: &Path,
    owner: &str,
) -> Result<PathBuf, DownloadError> {
    let dir = output_dir.join(owner);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| DownloadError::io(&dir, e))?;
    Ok(dir)
}

/// Builds `{base}/{wav|video}/{id}`, percent-encoding the id.
fn media_url(base: &str, kind: MediaKind, id: &str) -> Result<String, DownloadError> {
    let mut url =
        Url::parse(base).map_err(|_| DownloadError::invalid_input(id, "invalid media base URL"))?;
    url.path_segments_mut()
        .map_err(|()| DownloadError::invalid_input(id, "media base URL cannot have a path"))?
        .pop_if_empty()
        .push(kind.endpoint_segment())
        .push(id);
    Ok(url.into())
}

// Owners become a directory name, so reject anything that could escape it.
fn is_valid_owner(owner: &str) -> bool {
    !owner.is_empty()
        && owner != "."
        && owner != ".."
        && !owner.contains(['/', '\\'])
        && !owner.chars().any(char::is_control)
}

fn rejected_content_type(response: &reqwest::Response) -> Option<String> {
    let value = response.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    let mime = value.split(';').next().unwrap_or("").trim();
    mime.eq_ignore_ascii_case(HTML_CONTENT_TYPE)
        .then(|| value.to_string())
}

fn partial_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

/// Streams the response body to `part_path`, returning bytes written.
async fn write_part_file(
    response: reqwest::Response,
    url: &str,
    part_path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(part_path)
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(part_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    // Ensure all data reaches the file before the rename
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(part_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url_by_kind() {
        assert_eq!(
            media_url("https://media.example.com", MediaKind::Audio, "42").unwrap(),
            "https://media.example.com/wav/42"
        );
        assert_eq!(
            media_url("https://media.example.com/base/", MediaKind::Video, "42").unwrap(),
            "https://media.example.com/base/video/42"
        );
    }

    #[test]
    fn test_media_url_encodes_id() {
        let url = media_url("https://media.example.com", MediaKind::Video, "a/b c").unwrap();
        assert_eq!(url, "https://media.example.com/video/a%2Fb%20c");
    }

    #[test]
    fn test_owner_validation() {
        assert!(is_valid_owner("a@x.com"));
        assert!(!is_valid_owner(""));
        assert!(!is_valid_owner(".."));
        assert!(!is_valid_owner("a/../b"));
        assert!(!is_valid_owner("a\\b"));
    }

    #[test]
    fn test_partial_path_appends_suffix() {
        let part = partial_path(Path::new("out/a@x.com/2023-11-14T22:13:20.000Z Sync.m4a"));
        assert_eq!(
            part,
            Path::new("out/a@x.com/2023-11-14T22:13:20.000Z Sync.m4a.part")
        );
    }
}
