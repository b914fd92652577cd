//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use ftp_crawler_core::remote::ftp::{ANONYMOUS, DEFAULT_PORT};
use ftp_crawler_core::{DEFAULT_MAX_PACE, DEFAULT_MAX_RETRIES};

/// Default directory receiving downloaded files and the inventory.
pub const DEFAULT_OUTPUT_DIR: &str = "saved";

/// Default connect/read timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[allow(clippy::cast_possible_truncation)]
const DEFAULT_PACE_MAX_MS: u64 = DEFAULT_MAX_PACE.as_millis() as u64;

#[allow(clippy::cast_possible_truncation)]
const DEFAULT_RETRIES: u8 = DEFAULT_MAX_RETRIES as u8;

/// Crawl an FTP server for files worth a closer look.
///
/// Walks the whole remote tree, lists files whose extension or name is on
/// the watch list, downloads the ones that are interesting by name and
/// writes an inventory of everything found.
#[derive(Parser, Debug, Clone)]
#[command(name = "ftp-crawler")]
#[command(author, version, about)]
pub struct Args {
    /// FTP server to crawl: host, host:port or ftp://host[:port]
    #[arg(short = 't', long, value_name = "HOST")]
    pub target: String,

    /// Control port used when the target does not name one
    #[arg(long, default_value_t = DEFAULT_PORT, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Login user
    #[arg(short = 'u', long, default_value = ANONYMOUS)]
    pub user: String,

    /// Login password
    #[arg(short = 'p', long = "pass", default_value = ANONYMOUS, hide_default_value = true)]
    pub password: String,

    /// Report every file, not only the ones matching the rules
    #[arg(short = 'a', long)]
    pub all_files: bool,

    /// Download this single remote file and skip the crawl
    #[arg(short = 'f', long, value_name = "PATH")]
    pub download_file: Option<String>,

    /// Directory for downloads and the inventory file
    #[arg(short = 'o', long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Upper bound of the random pause between remote operations in milliseconds (0 to disable, max 60000)
    #[arg(long, default_value_t = DEFAULT_PACE_MAX_MS, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub pace_max_ms: u64,

    /// Extra attempts for transient download failures (0-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_RETRIES, value_parser = clap::value_parser!(u8).range(0..=10))]
    pub max_retries: u8,

    /// Do not ask the server for hidden entries (LIST -a)
    #[arg(long)]
    pub no_hidden: bool,

    /// Connect and read timeout in seconds (1-3600)
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout_secs: u64,

    /// Config file (default: $XDG_CONFIG_HOME/ftp-crawler/config.toml)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["ftp-crawler", "-t", "10.0.0.5"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    fn parse_err(extra: &[&str]) -> clap::error::ErrorKind {
        let mut argv = vec!["ftp-crawler", "-t", "10.0.0.5"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap_err().kind()
    }

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = parse(&[]);
        assert_eq!(args.target, "10.0.0.5");
        assert_eq!(args.port, 21);
        assert_eq!(args.user, "anonymous");
        assert_eq!(args.password, "anonymous");
        assert!(!args.all_files);
        assert!(args.download_file.is_none());
        assert_eq!(args.output_dir, PathBuf::from("saved"));
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert!(!args.debug);
        assert_eq!(args.pace_max_ms, 2000);
        assert_eq!(args.max_retries, 0);
        assert!(!args.no_hidden);
        assert_eq!(args.timeout_secs, 30);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_cli_missing_target_rejected() {
        let err = Args::try_parse_from(["ftp-crawler"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["ftp-crawler", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["ftp-crawler", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        assert_eq!(
            parse_err(&["--invalid-flag"]),
            clap::error::ErrorKind::UnknownArgument
        );
    }

    // ==================== Session Flags ====================

    #[test]
    fn test_cli_credentials_short_flags() {
        let args = parse(&["-u", "admin", "-p", "hunter2"]);
        assert_eq!(args.user, "admin");
        assert_eq!(args.password, "hunter2");
    }

    #[test]
    fn test_cli_port_flag() {
        assert_eq!(parse(&["--port", "2121"]).port, 2121);
        assert_eq!(parse_err(&["--port", "0"]), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_timeout_range() {
        assert_eq!(parse(&["--timeout-secs", "3600"]).timeout_secs, 3600);
        assert_eq!(
            parse_err(&["--timeout-secs", "0"]),
            clap::error::ErrorKind::ValueValidation
        );
        assert_eq!(
            parse_err(&["--timeout-secs", "3601"]),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_no_hidden_flag() {
        assert!(parse(&["--no-hidden"]).no_hidden);
    }

    // ==================== Mode Flags ====================

    #[test]
    fn test_cli_all_files_flag() {
        assert!(parse(&["-a"]).all_files);
        assert!(parse(&["--all-files"]).all_files);
    }

    #[test]
    fn test_cli_download_file_flag() {
        let args = parse(&["-f", "/etc/passwd"]);
        assert_eq!(args.download_file.as_deref(), Some("/etc/passwd"));
    }

    #[test]
    fn test_cli_output_dir_flag() {
        assert_eq!(parse(&["-o", "/tmp/loot"]).output_dir, PathBuf::from("/tmp/loot"));
    }

    // ==================== Verbosity Flags ====================

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        assert_eq!(parse(&["-v"]).verbose, 1);
        assert_eq!(parse(&["-vv"]).verbose, 2);
        assert_eq!(parse(&["--verbose", "--verbose"]).verbose, 2);
    }

    #[test]
    fn test_cli_quiet_and_debug_flags() {
        assert!(parse(&["-q"]).quiet);
        assert!(parse(&["--quiet"]).quiet);
        assert!(parse(&["-d"]).debug);
    }

    // ==================== Pacing and Retry Tests ====================

    #[test]
    fn test_cli_pace_zero_disables() {
        assert_eq!(parse(&["--pace-max-ms", "0"]).pace_max_ms, 0);
    }

    #[test]
    fn test_cli_pace_over_max_rejected() {
        assert_eq!(parse(&["--pace-max-ms", "60000"]).pace_max_ms, 60000);
        assert_eq!(
            parse_err(&["--pace-max-ms", "60001"]),
            clap::error::ErrorKind::ValueValidation
        );
    }

    #[test]
    fn test_cli_max_retries_range() {
        assert_eq!(parse(&["-r", "10"]).max_retries, 10);
        assert_eq!(parse(&["--max-retries", "3"]).max_retries, 3);
        assert_eq!(parse_err(&["-r", "11"]), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_combined_flags() {
        let args = parse(&["-a", "-r", "2", "--pace-max-ms", "500", "-o", "out", "-v"]);
        assert!(args.all_files);
        assert_eq!(args.max_retries, 2);
        assert_eq!(args.pace_max_ms, 500);
        assert_eq!(args.output_dir, PathBuf::from("out"));
        assert_eq!(args.verbose, 1);
    }
}
