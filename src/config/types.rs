//! Core configuration types.
//! - WatchSettings holds the resolved, immutable run parameters.
//! - LogLevel represents verbosity with simple parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::paths;
use super::{DEFAULT_CACHE_TIME_SECS, DEFAULT_MAX_RETRIES};

/// Program-defined verbosity levels exposed to users/config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Informational output (default)
    #[default]
    Normal,
    /// More info (like verbose)
    Info,
    /// Debug/trace
    Debug,
}

impl LogLevel {
    /// Parse common string names into our LogLevel (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" => Some(LogLevel::Normal),
            "info" | "verbose" | "detailed" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Resolved run parameters. Immutable once the engine starts.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Directory to watch (non-recursive)
    pub watch_path: PathBuf,
    /// File name filter; `*` and `?` wildcards, matched against the bare name
    pub file_filter: String,
    /// Directory the file is copied into
    pub destination: PathBuf,
    /// How often the orchestrator wakes to log liveness
    pub poll_interval: Duration,
    /// Per-entry wait before each lock check
    pub cache_ttl: Duration,
    /// Re-arms allowed after the first failed lock check
    pub max_retries: u32,
    /// Give up with NotFound after this long (None = wait forever)
    pub timeout: Option<Duration>,
    /// Console verbosity
    pub log_level: LogLevel,
    /// Optional path to a log file
    pub log_file: Option<PathBuf>,
    /// Emit JSON log lines instead of compact text
    pub json_logs: bool,
}

impl WatchSettings {
    /// Settings with explicit core values; the rest use defaults.
    pub fn new(
        watch_path: impl Into<PathBuf>,
        file_filter: impl Into<String>,
        destination: impl Into<PathBuf>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            watch_path: watch_path.into(),
            file_filter: file_filter.into(),
            destination: destination.into(),
            poll_interval,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TIME_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            timeout: None,
            log_level: LogLevel::Normal,
            log_file: paths::default_log_path(),
            json_logs: false,
        }
    }

    /// Multi-line summary printed before watching starts.
    pub fn summary(&self) -> String {
        format!(
            "Path - {}\nName - {}\nDestination - {}\nPollingIntervalMilliSec - {}\nCacheTimeSeconds - {}\nMaxRetries - {}",
            self.watch_path.display(),
            self.file_filter,
            self.destination.display(),
            self.poll_interval.as_millis(),
            self.cache_ttl.as_secs(),
            self.max_retries
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_parse_aliases() {
        assert_eq!(LogLevel::parse("ERROR"), Some(LogLevel::Quiet));
        assert_eq!(LogLevel::parse("verbose"), Some(LogLevel::Info));
        assert_eq!(LogLevel::parse("trace"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn new_uses_defaults_for_retry_knobs() {
        let s = WatchSettings::new("/in", "*.csv", "/out", Duration::from_millis(250));
        assert_eq!(s.cache_ttl, Duration::from_secs(DEFAULT_CACHE_TIME_SECS));
        assert_eq!(s.max_retries, DEFAULT_MAX_RETRIES);
        assert!(s.timeout.is_none());
        let summary = s.summary();
        assert!(summary.contains("Name - *.csv"));
        assert!(summary.contains("PollingIntervalMilliSec - 250"));
    }
}
