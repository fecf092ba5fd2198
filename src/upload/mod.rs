//! Upload phase: stored media to destination call records.
//!
//! - [`UserIndex`] maps owner emails to destination user ids
//! - [`prepare_call`] turns a stored file name into a create-call body
//! - [`DestinationClient`] performs the create and media-attach requests,
//!   each retried once on HTTP 429
//! - [`UploadPipeline`] drives a whole year of files with failure isolation

mod call_data;
mod client;
mod error;
mod pipeline;
mod retry;
mod user_index;

pub use call_data::{
    MIGRATED_TITLE_SUFFIX, PreparedCall, UNKNOWN_DIRECTION, idempotency_key, prepare_call,
};
pub use client::{
    AttachedMedia, CreatedCall, DestinationClient, DestinationUser, MEDIA_FIELD_NAME, NewCall,
    Party, UserRecords, UsersPage,
};
pub use error::UploadError;
pub use pipeline::{UploadOutcome, UploadPipeline, UploadReport, find_files_for_year};
pub use retry::{FALLBACK_RETRY_AFTER, MAX_RETRY_AFTER, parse_retry_after};
pub use user_index::UserIndex;
