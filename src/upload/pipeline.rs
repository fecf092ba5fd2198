//! Batch upload driver.
//!
//! For every stored file of the target year: derive the call metadata,
//! create the call, attach the media. A failing file is logged and recorded
//! and the batch moves on; the final [`UploadReport`] lists every failure so
//! the operator can re-run just those files.

use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use super::call_data::prepare_call;
use super::client::DestinationClient;
use super::error::UploadError;
use super::user_index::UserIndex;
use crate::config::DestinationConfig;

/// Suffix of in-flight download files, never uploaded.
const PARTIAL_SUFFIX: &str = ".part";

/// What happened to one successfully processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Call created and media attached.
    Uploaded {
        /// Id returned by the create step.
        call_id: String,
        /// Id returned by the media step (normally equal to `call_id`).
        media_call_id: String,
        /// Where the call will be viewable.
        url: Option<String>,
    },
    /// Dry run: call data derived but nothing sent.
    Planned {
        /// Title the call would get.
        title: String,
    },
}

/// Totals for one upload run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    /// Files matched for the year.
    pub total: usize,
    /// Files fully processed.
    pub uploaded: usize,
    /// Files that failed at any step.
    pub failed: Vec<PathBuf>,
}

/// Finds stored files whose name starts with `{year}-`, in sorted order.
///
/// Unreadable directory entries are logged and skipped.
#[must_use]
pub fn find_files_for_year(output_dir: &Path, year: u16) -> Vec<PathBuf> {
    let prefix = format!("{year}-");
    let mut files: Vec<PathBuf> = WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry.file_name().to_str().is_some_and(|name| {
                name.starts_with(&prefix) && !name.ends_with(PARTIAL_SUFFIX)
            })
        })
        .map(walkdir::DirEntry::into_path)
        .collect();
    files.sort();
    files
}

/// Uploads stored files to the destination, one at a time.
#[derive(Debug)]
pub struct UploadPipeline {
    client: DestinationClient,
    users: UserIndex,
    config: DestinationConfig,
    dry_run: bool,
    progress: ProgressBar,
}

impl UploadPipeline {
    /// Creates a pipeline. `users` must already be loaded.
    #[must_use]
    pub fn new(client: DestinationClient, users: UserIndex, config: DestinationConfig) -> Self {
        Self {
            client,
            users,
            config,
            dry_run: false,
            progress: ProgressBar::hidden(),
        }
    }

    /// Derive and log call data without calling the create/attach endpoints.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Progress bar advanced once per processed file.
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Creates the call for one file and attaches its media.
    ///
    /// A call id mismatch between the two steps is logged, not returned as an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns the first [`UploadError`] from derivation, creation or upload.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn process_file(&self, path: &Path) -> Result<UploadOutcome, UploadError> {
        let prepared = prepare_call(path, &self.users, &self.config)?;

        if self.dry_run {
            info!(
                title = %prepared.call.title,
                actual_start = %prepared.call.actual_start,
                primary_user = %prepared.call.primary_user,
                unique_id = %prepared.call.client_unique_id,
                "dry run, call not created"
            );
            return Ok(UploadOutcome::Planned {
                title: prepared.call.title,
            });
        }

        let created = self.client.create_call(&prepared.call).await?;
        info!(
            call_id = %created.call_id,
            request_id = ?created.request_id,
            "call created"
        );

        info!("starting media upload");
        let attached = self
            .client
            .upload_media(&created.call_id, path, &prepared.upload_name)
            .await?;
        info!(
            call_id = %attached.call_id,
            request_id = ?attached.request_id,
            "call media uploaded"
        );

        if attached.call_id != created.call_id {
            warn!(
                create_call_id = %created.call_id,
                upload_call_id = %attached.call_id,
                "create and upload returned different call ids"
            );
        }
        if let Some(url) = &attached.url {
            info!(url = %url, "call will be available shortly");
        }

        Ok(UploadOutcome::Uploaded {
            call_id: created.call_id,
            media_call_id: attached.call_id,
            url: attached.url,
        })
    }

    /// Processes every file in order. Never stops on a failing file.
    pub async fn run(&self, files: &[PathBuf]) -> UploadReport {
        let mut report = UploadReport {
            total: files.len(),
            ..UploadReport::default()
        };
        self.progress.set_length(files.len() as u64);

        for path in files {
            debug!(path = %path.display(), "processing file");
            match self.process_file(path).await {
                Ok(_) => report.uploaded += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "upload failed");
                    report.failed.push(path.clone());
                }
            }
            info!(
                uploaded = report.uploaded,
                total = report.total,
                failed = report.failed.len(),
                "upload progress"
            );
            self.progress.inc(1);
        }

        self.progress.finish_and_clear();
        report
    }
}
