//! Core library for `file_watcher`.
//!
//! Watches a directory for a file, waits until no other process holds it, then
//! copies it into a destination directory. The moving parts, leaves first:
//! - `fs_ops`: lock probe and the no-overwrite copy
//! - `cache`: pending files with a deadline each
//! - `engine`: the decision logic fed by directory events and deadlines
//! - `orchestrator`: starts the engine and waits for a terminal `Outcome`

pub mod cache;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs_ops;
pub mod orchestrator;
pub mod outcome;
pub mod output;
pub mod platform;

pub use cache::{ExpiringRetryCache, PendingFile};
pub use config::{
    default_config_path, default_log_path, load_settings_from_xml_path, path_has_symlink_ancestor,
    resolve_settings, LogLevel, WatchSettings,
};
pub use engine::{EngineState, Expiry, WatchEngine, WatchEvent, WatchHandle, WatchStop};
pub use errors::{ConfigError, WatcherError};
pub use fs_ops::{copy_into_destination, probe_lock, FsLockProbe, LockProbe, LockStatus};
pub use orchestrator::{run_watch, run_watch_with};
pub use outcome::{Outcome, SharedOutcome};
