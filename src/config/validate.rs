//! Settings validation.
//! Checks the filter, the timing knobs and the destination directory. The watch
//! path is deliberately not checked here: a missing watch path is a `NotFound`
//! outcome decided by the orchestrator, not a configuration error.

use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::types::WatchSettings;
use crate::errors::ConfigError;

impl WatchSettings {
    /// Validate settings and create the destination directory if it is missing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        compile_filter(&self.file_filter)?;

        if self.poll_interval.is_zero() {
            return Err(invalid("PollingIntervalMilliSec", "0", "must be greater than zero"));
        }
        if self.cache_ttl.is_zero() {
            return Err(invalid("CacheTimeSeconds", "0", "must be greater than zero"));
        }
        // Deadlines are `now + ttl`; the sum must stay representable.
        if Instant::now().checked_add(self.cache_ttl).is_none() {
            return Err(invalid(
                "CacheTimeSeconds",
                &self.cache_ttl.as_secs().to_string(),
                "too large",
            ));
        }

        ensure_dir_is_or_create(&self.destination)?;

        // Copying into the watched directory would re-trigger the watcher on our own output.
        if let (Ok(w), Ok(d)) = (dunce::canonicalize(&self.watch_path), dunce::canonicalize(&self.destination)) {
            if w == d {
                return Err(invalid(
                    "Destination",
                    &self.destination.display().to_string(),
                    "must differ from the watch path",
                ));
            }
        }

        info!(
            watch = %self.watch_path.display(),
            filter = %self.file_filter,
            destination = %self.destination.display(),
            "Settings validated"
        );
        Ok(())
    }
}

/// Compile the name filter into a matcher for bare file names.
/// The filter must name a file, not a path.
pub fn compile_filter(pattern: &str) -> Result<GlobMatcher, ConfigError> {
    if pattern.trim().is_empty() {
        return Err(ConfigError::Missing("fileName"));
    }
    if pattern.contains('/') || pattern.contains('\\') {
        return Err(invalid("fileName", pattern, "must be a file name, not a path"));
    }
    // Windows file names are case-insensitive.
    GlobBuilder::new(pattern)
        .case_insensitive(cfg!(windows))
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| invalid("fileName", pattern, &e.to_string()))
}

fn ensure_dir_is_or_create(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::Missing("Destination"));
    }
    if path.exists() {
        if !path.is_dir() {
            return Err(invalid("Destination", &path.display().to_string(), "exists but isn't a directory"));
        }
        debug!("Destination exists: {}", path.display());
    } else {
        fs::create_dir_all(path)
            .map_err(|e| invalid("Destination", &path.display().to_string(), &e.to_string()))?;
        info!("Created destination directory: {}", path.display());
    }
    Ok(())
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
