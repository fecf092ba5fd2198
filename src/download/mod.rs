//! Download phase: engagement media to local storage.
//!
//! # Features
//!
//! - Streaming downloads to a `.part` file, renamed into place on success
//! - HTML responses (expired session) rejected before anything is written
//! - One concurrent download stream per session, sequential within a stream
//! - Per-record failure isolation with an id list for re-runs
//!
//! # Example
//!
//! ```no_run
//! use migrator_core::download::{MediaDownloader, dispatch_page};
//! use migrator_core::source::{PageGenerator, SourceClient};
//! use migrator_core::config::SourceConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SourceConfig::from_env()?;
//! let http = migrator_core::http::build_client()?;
//! let source = SourceClient::new(http.clone(), &config.api_url, &config.api_token);
//! let downloader = MediaDownloader::new(http, &config.media_url, "output");
//!
//! let mut pages = PageGenerator::new(&source);
//! while let Some(page) = pages.next_page().await? {
//!     let report = dispatch_page(&downloader, &page.records, &config.sessions).await;
//!     println!("failed: {:?}", report.failed);
//! }
//! # Ok(())
//! # }
//! ```

mod dispatcher;
mod downloader;
mod error;

pub use dispatcher::{
    DownloadReport, dispatch_page, download_all, download_slice, split_into_slices,
};
pub use downloader::{DownloadOutcome, MediaDownloader, ensure_user_directory};
pub use error::DownloadError;

// Note: no module-local Result alias. Use `Result<T, DownloadError>` explicitly.
