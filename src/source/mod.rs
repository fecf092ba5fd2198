//! Source platform access: engagement listing, pagination and sessions.
//!
//! - [`SourceClient`] talks to the engagement collection endpoint
//! - [`PageGenerator`] walks the collection one page at a time
//! - [`SessionPool`] holds the download session cookies

mod client;
mod error;
mod pages;
mod session;
mod types;

pub use client::SourceClient;
pub use error::SourceError;
pub use pages::PageGenerator;
pub use session::{Session, SessionPool};
pub use types::{Engagement, EngagementBatch, EngagementPage, EngagementType, MediaKind};
