//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default local storage root shared by both phases.
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Migrate recorded calls and meetings between conversation platforms.
///
/// Run `download` first to copy every engagement's media to local storage,
/// then `upload <YEAR>` to create destination calls from the stored files.
/// Credentials are read from the environment (a `.env` file is honored).
#[derive(Parser, Debug)]
#[command(name = "call-migrator")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Migration phase to run.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download every engagement's media from the source platform
    Download {
        /// Local storage root; one directory per owner email is created inside
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Leave files that already exist untouched instead of re-downloading
        #[arg(long)]
        skip_existing: bool,
    },

    /// Create destination calls from stored files of one year
    Upload {
        /// Calendar year of the stored files to upload (e.g. 2023)
        #[arg(value_parser = clap::value_parser!(u16).range(1970..=9999))]
        year: u16,

        /// Local storage root written by `download`
        #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Derive and log call data without creating anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_download_defaults() {
        let args = Args::try_parse_from(["call-migrator", "download"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        match args.command {
            Command::Download {
                output_dir,
                skip_existing,
            } => {
                assert_eq!(output_dir, PathBuf::from("output"));
                assert!(!skip_existing);
            }
            Command::Upload { .. } => panic!("expected download"),
        }
    }

    #[test]
    fn test_cli_download_flags() {
        let args = Args::try_parse_from([
            "call-migrator",
            "download",
            "--skip-existing",
            "-o",
            "/data/media",
        ])
        .unwrap();
        match args.command {
            Command::Download {
                output_dir,
                skip_existing,
            } => {
                assert_eq!(output_dir, PathBuf::from("/data/media"));
                assert!(skip_existing);
            }
            Command::Upload { .. } => panic!("expected download"),
        }
    }

    #[test]
    fn test_cli_upload_year() {
        let args = Args::try_parse_from(["call-migrator", "upload", "2023", "--dry-run"]).unwrap();
        match args.command {
            Command::Upload {
                year,
                output_dir,
                dry_run,
            } => {
                assert_eq!(year, 2023);
                assert_eq!(output_dir, PathBuf::from("output"));
                assert!(dry_run);
            }
            Command::Download { .. } => panic!("expected upload"),
        }
    }

    #[test]
    fn test_cli_upload_requires_year() {
        let err = Args::try_parse_from(["call-migrator", "upload"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_upload_rejects_non_numeric_year() {
        let err = Args::try_parse_from(["call-migrator", "upload", "last"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let result = Args::try_parse_from(["call-migrator"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["call-migrator", "-v", "download"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["call-migrator", "download", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["call-migrator", "--quiet", "upload", "2022"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["call-migrator", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["call-migrator", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err =
            Args::try_parse_from(["call-migrator", "download", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }
}
