//! Distribution of one page across the session pool.
//!
//! A page is cut into contiguous slices of `ceil(len / sessions)` records;
//! slice `i` is downloaded with session `i`. Slices run concurrently on the
//! current task (their futures are joined, not spawned), and each slice
//! downloads strictly one record at a time. A failing record is counted and
//! never stops its slice or any other slice.

use futures_util::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::downloader::{DownloadOutcome, MediaDownloader};
use crate::source::{Engagement, PageGenerator, Session, SessionPool, SourceError};

/// Outcome counts for one slice, page or whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    /// Records written to disk.
    pub downloaded: usize,
    /// Records skipped because the file already existed.
    pub skipped: usize,
    /// Ids of records that failed (an empty id is kept as-is).
    pub failed: Vec<String>,
}

impl DownloadReport {
    /// Creates an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of failed records.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Total records processed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed.len()
    }

    /// Adds another report's counts to this one.
    pub fn merge(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }
}

/// Splits `records` into contiguous, ordered slices for `pool_size` sessions.
///
/// Produces at most `pool_size` slices; trailing sessions receive nothing when
/// the page is short. An empty page or zero pool size yields no slices.
#[must_use]
pub fn split_into_slices(records: &[Engagement], pool_size: usize) -> Vec<&[Engagement]> {
    if records.is_empty() || pool_size == 0 {
        return Vec::new();
    }
    let slice_len = records.len().div_ceil(pool_size);
    records.chunks(slice_len).collect()
}

/// Downloads every record of one slice sequentially with one session.
pub async fn download_slice(
    downloader: &MediaDownloader,
    records: &[Engagement],
    session: &Session,
) -> DownloadReport {
    let mut report = DownloadReport::new();

    for engagement in records {
        match downloader.download_engagement(engagement, session).await {
            Ok(DownloadOutcome::Downloaded { .. }) => report.downloaded += 1,
            Ok(DownloadOutcome::Skipped { .. }) => report.skipped += 1,
            Err(e) => {
                warn!(id = %engagement.id, error = %e, "engagement download failed");
                report.failed.push(engagement.id.clone());
            }
        }
    }

    report
}

/// Downloads one page, one concurrent slice per session.
///
/// Returns once every slice has finished.
#[instrument(skip_all, fields(records = records.len(), sessions = pool.len()))]
pub async fn dispatch_page(
    downloader: &MediaDownloader,
    records: &[Engagement],
    pool: &SessionPool,
) -> DownloadReport {
    let slices = split_into_slices(records, pool.len());
    debug!(slices = slices.len(), "dispatching page");

    let runs = slices
        .into_iter()
        .zip(pool.sessions())
        .enumerate()
        .map(|(index, (slice, session))| async move {
            let report = download_slice(downloader, slice, session).await;
            debug!(
                slice = index,
                downloaded = report.downloaded,
                skipped = report.skipped,
                failed = report.failed_count(),
                "slice finished"
            );
            report
        });

    let mut page_report = DownloadReport::new();
    for report in join_all(runs).await {
        page_report.merge(report);
    }

    info!(
        downloaded = page_report.downloaded,
        skipped = page_report.skipped,
        failed = page_report.failed_count(),
        "page finished"
    );
    page_report
}

/// Walks every page and dispatches each one before fetching the next.
///
/// Only one page of records is held in memory at a time. Records that did
/// not decode are counted as failed without a request.
///
/// # Errors
///
/// Returns [`SourceError`] if a page cannot be fetched. Counts for the pages
/// already processed are logged before returning.
pub async fn download_all(
    pages: &mut PageGenerator<'_>,
    downloader: &MediaDownloader,
    pool: &SessionPool,
) -> Result<DownloadReport, SourceError> {
    let mut run_report = DownloadReport::new();

    loop {
        let page = match pages.next_page().await {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(e) => {
                warn!(
                    pages = pages.pages_fetched(),
                    processed = run_report.total(),
                    "stopping: engagement page fetch failed"
                );
                return Err(e);
            }
        };

        let mut page_report = dispatch_page(downloader, &page.records, pool).await;
        page_report.failed.extend(page.malformed);
        run_report.merge(page_report);
        info!(
            running_total = run_report.total(),
            downloaded = run_report.downloaded,
            failed = run_report.failed_count(),
            "running total"
        );
    }

    Ok(run_report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(count: usize) -> Vec<Engagement> {
        (0..count)
            .map(|i| Engagement {
                id: i.to_string(),
                user: "a@x.com".to_string(),
                subject: None,
                date_time: Some(0),
                engagement_type: crate::source::EngagementType::Meeting,
            })
            .collect()
    }

    fn ids(slice: &[Engagement]) -> Vec<&str> {
        slice.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_split_even_page() {
        let page = records(6);
        let slices = split_into_slices(&page, 3);
        assert_eq!(slices.len(), 3);
        assert_eq!(ids(slices[0]), ["0", "1"]);
        assert_eq!(ids(slices[2]), ["4", "5"]);
    }

    #[test]
    fn test_split_covers_every_record_once_in_order() {
        for len in 0..25 {
            for pool_size in 1..7 {
                let page = records(len);
                let slices = split_into_slices(&page, pool_size);
                assert!(slices.len() <= pool_size);
                assert_eq!(slices.iter().map(|s| s.len()).sum::<usize>(), len);

                let flattened: Vec<&str> = slices.iter().flat_map(|s| ids(s)).collect();
                let expected: Vec<&str> = page.iter().map(|e| e.id.as_str()).collect();
                assert_eq!(flattened, expected, "len={len} pool={pool_size}");
            }
        }
    }

    #[test]
    fn test_split_short_page_leaves_trailing_sessions_idle() {
        let page = records(5);
        let slices = split_into_slices(&page, 4);
        // ceil(5/4) = 2 -> [0,1] [2,3] [4]
        assert_eq!(slices.len(), 3);
        assert_eq!(ids(slices[2]), ["4"]);
    }

    #[test]
    fn test_split_empty_page() {
        assert!(split_into_slices(&[], 3).is_empty());
    }

    #[test]
    fn test_report_merge_and_total() {
        let mut report = DownloadReport {
            downloaded: 2,
            skipped: 1,
            failed: vec!["7".to_string()],
        };
        report.merge(DownloadReport {
            downloaded: 1,
            skipped: 0,
            failed: vec!["9".to_string()],
        });
        assert_eq!(report.total(), 5);
        assert_eq!(report.failed, ["7", "9"]);
    }
}
