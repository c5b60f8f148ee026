//! Typed error definitions for file_watcher.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Watch path not found or not a directory: {0}")]
    WatchPathNotFound(PathBuf),

    #[error("Destination already contains {0}; refusing to overwrite")]
    DestinationExists(PathBuf),

    #[error("Copy failed {src} -> {dest}: {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("File system watcher failure: {0}")]
    Watch(#[from] notify::Error),

    #[error("Failed to start the watch engine thread: {0}")]
    Thread(#[source] io::Error),
}

impl WatcherError {
    /// Short machine-friendly tag used in structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            WatcherError::WatchPathNotFound(_) => "watch_path_not_found",
            WatcherError::DestinationExists(_) => "collision",
            WatcherError::Copy { .. } => "copy_failed",
            WatcherError::Config(_) => "config",
            WatcherError::Watch(_) => "watcher",
            WatcherError::Thread(_) => "thread",
        }
    }
}

/// Configuration failures; all of them end the run with `MissingParams`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Expected all four positional arguments (watch path, file name, destination, poll interval); got {0}")]
    PartialPositionals(usize),

    #[error("A template config was written to {0}; edit it and re-run")]
    TemplateCreated(PathBuf),
}
