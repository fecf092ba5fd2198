//! Call metadata derived from a stored media file name.

use std::path::Path;

use sha2::{Digest, Sha256};

use super::client::{NewCall, Party};
use super::error::UploadError;
use super::user_index::UserIndex;
use crate::config::DestinationConfig;
use crate::media_name::MediaFileName;

/// Suffix appended to every migrated call title.
pub const MIGRATED_TITLE_SUFFIX: &str = " (Migrated)";

/// Direction reported for migrated calls; the source does not record it.
pub const UNKNOWN_DIRECTION: &str = "Unknown";

/// A call ready to be created, plus what the media upload step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    /// Create-call request body.
    pub call: NewCall,
    /// Parsed stored file name.
    pub media: MediaFileName,
    /// File name sent with the multipart upload.
    pub upload_name: String,
}

/// Derives the create-call body for the file at `path`.
///
/// The idempotency key is the SHA-256 of the owner-relative file name, so
/// re-running the upload against the same file sends the same key.
///
/// # Errors
///
/// - [`UploadError::InvalidFileName`] if `path` does not follow the stored layout
/// - [`UploadError::Config`] if `users` has not been loaded
pub fn prepare_call(
    path: &Path,
    users: &UserIndex,
    config: &DestinationConfig,
) -> Result<PreparedCall, UploadError> {
    let media = MediaFileName::parse_path(path)?;
    let user_id = users.resolve_or(&media.owner, &config.default_owner_id)?;

    let call = NewCall {
        title: format!("{}{MIGRATED_TITLE_SUFFIX}", media.title),
        actual_start: media.actual_start(),
        client_unique_id: idempotency_key(&media),
        custom_data: config.migration_tag.clone(),
        direction: UNKNOWN_DIRECTION.to_string(),
        primary_user: user_id.to_string(),
        parties: vec![Party {
            email_address: media.owner.clone(),
            user_id: user_id.to_string(),
        }],
        workspace_id: config.workspace_id.clone(),
    };

    Ok(PreparedCall {
        call,
        upload_name: media.file_name(),
        media,
    })
}

/// Hex SHA-256 of `{owner}/{file name}`.
#[must_use]
pub fn idempotency_key(media: &MediaFileName) -> String {
    format!("{:x}", Sha256::digest(media.relative_key().as_bytes()))
}
