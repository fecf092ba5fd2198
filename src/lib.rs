//! Call Migrator Core Library
//!
//! Moves recorded calls and meetings from the source conversation
//! intelligence platform to the destination platform in two phases:
//! media is first downloaded to local storage, then each stored file is
//! turned into a destination call record with its media attached.
//!
//! # Architecture
//!
//! - [`config`] - Environment-driven configuration for both phases
//! - [`source`] - Engagement listing API, cursor pagination, session pool
//! - [`download`] - Media downloads distributed across sessions
//! - [`media_name`] - The stored file naming scheme shared by both phases
//! - [`upload`] - User index, call creation, media attachment, batch driver
//! - [`http`] - Shared HTTP client construction

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod http;
pub mod media_name;
pub mod source;
pub mod upload;

// Re-export commonly used types
pub use config::{ConfigError, DestinationConfig, SourceConfig};
pub use download::{DownloadError, DownloadReport, MediaDownloader, dispatch_page, download_all};
pub use media_name::{MediaFileName, MediaNameError};
pub use source::{
    Engagement, EngagementType, PageGenerator, Session, SessionPool, SourceClient, SourceError,
};
pub use upload::{
    DestinationClient, UploadError, UploadPipeline, UploadReport, UserIndex, find_files_for_year,
};
