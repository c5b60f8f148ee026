//! CLI definition and parsing.
//! Defines Args and provides parse() for command-line handling.
//!
//! Notes:
//! - The four positionals are all-or-nothing; with none given, the settings file is used.
//! - The poll interval positional stays a string so a bad value maps to the
//!   missing-parameters exit code instead of clap's usage error.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::LogLevel;

/// Wait for a file to appear, wait until it is unlocked, then copy it.
/// Flags override settings-file values.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    author,
    version,
    about = "Watch a directory for a file, wait until it is unlocked, then copy it"
)]
pub struct Args {
    /// Directory to watch.
    #[arg(value_name = "WATCH_PATH", value_hint = ValueHint::DirPath)]
    pub watch_path: Option<PathBuf>,

    /// File name or pattern to wait for (`*` and `?` wildcards).
    #[arg(value_name = "FILE_NAME")]
    pub file_name: Option<String>,

    /// Directory the file is copied into.
    #[arg(value_name = "DESTINATION", value_hint = ValueHint::DirPath)]
    pub destination: Option<PathBuf>,

    /// Progress logging interval in milliseconds.
    #[arg(value_name = "POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<String>,

    /// Seconds to wait between lock checks of a detected file.
    #[arg(long, value_name = "SECS", help = "Seconds between lock checks (overrides CacheTimeSeconds)")]
    pub cache_time_secs: Option<u64>,

    /// Lock re-checks before a detected file is abandoned.
    #[arg(long, value_name = "N", help = "Lock re-checks before giving up on a file (overrides MaxRetries)")]
    pub max_retries: Option<u32>,

    /// Give up (exit code 1) if nothing has been copied after this many seconds.
    #[arg(long, value_name = "SECS", help = "Exit with code 1 if no file was copied in time")]
    pub timeout_secs: Option<u64>,

    /// Enable debug logging (equivalent to `--log-level debug`).
    #[arg(
        short = 'd',
        long,
        help = "Enable debug logging (shorthand for --log-level debug)"
    )]
    pub debug: bool,

    /// Set log level. One of: quiet, normal, info, debug.
    #[arg(long, help = "Set log level: quiet, normal, info, debug")]
    pub log_level: Option<String>,

    /// Write logs to this file in addition to stdout.
    #[arg(long, value_hint = ValueHint::FilePath, help = "Also write logs to this file")]
    pub log_file: Option<PathBuf>,

    /// Print where file_watcher will look for its settings file, then exit.
    #[arg(long, help = "Print the settings file location and exit")]
    pub print_config: bool,

    /// Emit logs in structured JSON (includes timestamp, level, and structured fields).
    #[arg(long, help = "Emit logs in structured JSON")]
    pub json: bool,
}

impl Args {
    /// How many of the four core positionals were supplied.
    pub fn positional_count(&self) -> usize {
        [
            self.watch_path.is_some(),
            self.file_name.is_some(),
            self.destination.is_some(),
            self.poll_interval_ms.is_some(),
        ]
        .into_iter()
        .filter(|given| *given)
        .count()
    }

    /// Effective log level derived from flags.
    /// Precedence: --debug > --log-level value > None (use settings file / default).
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }
}

pub fn parse() -> Args {
    Args::parse()
}
