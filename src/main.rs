//! CLI entry point for the call migrator.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use migrator_core::{
    DestinationClient, DestinationConfig, MediaDownloader, PageGenerator, SourceClient,
    SourceConfig, UploadPipeline, UserIndex, download_all, find_files_for_year, http,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "no .env file loaded");
    }

    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::Download {
            output_dir,
            skip_existing,
        } => run_download(output_dir, skip_existing).await,
        Command::Upload {
            year,
            output_dir,
            dry_run,
        } => run_upload(year, &output_dir, dry_run, args.quiet).await,
    }
}

async fn run_download(output_dir: PathBuf, skip_existing: bool) -> Result<()> {
    let config = SourceConfig::from_env().context("source configuration")?;
    info!(
        sessions = config.sessions.len(),
        output_dir = %output_dir.display(),
        "download starting"
    );

    let client = http::build_client().context("failed to build HTTP client")?;
    let source = SourceClient::new(client.clone(), &config.api_url, &config.api_token);
    let downloader = MediaDownloader::new(client, &config.media_url, output_dir)
        .with_skip_existing(skip_existing);

    let mut pages = PageGenerator::new(&source);
    let report = download_all(&mut pages, &downloader, &config.sessions)
        .await
        .context("engagement listing failed")?;

    info!(
        pages = pages.pages_fetched(),
        downloaded = report.downloaded,
        skipped = report.skipped,
        failed = report.failed_count(),
        total = report.total(),
        "download complete"
    );
    if !report.failed.is_empty() {
        warn!(ids = ?report.failed, "engagements that failed to download");
    }

    Ok(())
}

async fn run_upload(year: u16, output_dir: &Path, dry_run: bool, quiet: bool) -> Result<()> {
    let config = DestinationConfig::from_env().context("destination configuration")?;

    let files = find_files_for_year(output_dir, year);
    if files.is_empty() {
        info!(year, output_dir = %output_dir.display(), "no stored files for year");
        return Ok(());
    }
    info!(year, files = files.len(), dry_run, "upload starting");

    let client = http::build_client().context("failed to build HTTP client")?;
    let destination = DestinationClient::new(client, &config.api_url, &config.api_token);

    let users = UserIndex::load(&destination)
        .await
        .context("failed to load destination users")?;
    info!(users = users.len(), "user index loaded");

    let pipeline = UploadPipeline::new(destination, users, config)
        .with_dry_run(dry_run)
        .with_progress(create_progress_bar(quiet, files.len() as u64));
    let report = pipeline.run(&files).await;

    info!(
        uploaded = report.uploaded,
        failed = report.failed.len(),
        total = report.total,
        "upload complete"
    );
    for path in &report.failed {
        warn!(path = %path.display(), "file failed to upload");
    }

    Ok(())
}

/// Hidden when quiet or when stderr is not a terminal.
fn create_progress_bar(quiet: bool, total: u64) -> ProgressBar {
    if quiet || !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}
