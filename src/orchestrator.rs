//! Run orchestration.
//! Checks the watch directory, starts the engine, then blocks the calling thread
//! in a wait/log loop until a terminal outcome is reached.

use chrono::Local;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::config::WatchSettings;
use crate::engine;
use crate::errors::WatcherError;
use crate::fs_ops::LockProbe;
use crate::outcome::{Outcome, SharedOutcome};

/// Watch until the file is copied (or the run ends otherwise) and return the outcome.
pub fn run_watch<P: LockProbe>(settings: &WatchSettings, probe: P) -> Outcome {
    run_watch_with(settings, probe, SharedOutcome::new())
}

/// Same as `run_watch`, with a caller-owned outcome cell.
pub fn run_watch_with<P: LockProbe>(settings: &WatchSettings, probe: P, outcome: Arc<SharedOutcome>) -> Outcome {
    if !settings.watch_path.is_dir() {
        info!(path = %settings.watch_path.display(), "Path does not exist");
        return Outcome::NotFound;
    }
    info!("Path exists - starting file watcher");

    let handle = match engine::spawn(settings, probe, Arc::clone(&outcome)) {
        Ok(h) => h,
        Err(e) => {
            error!(kind = e.kind(), error = %e, "failed to start file watcher");
            return match e {
                WatcherError::WatchPathNotFound(_) => Outcome::NotFound,
                WatcherError::Config(_) => Outcome::MissingParams,
                _ => Outcome::Exception,
            };
        }
    };

    let started = Instant::now();
    loop {
        let current = outcome.wait_timeout(settings.poll_interval);
        if current.is_terminal() {
            return current;
        }

        if handle.is_finished() {
            let mut guard = outcome.lock();
            if !guard.is_terminal() {
                error!("watch engine stopped before a file was moved");
                outcome.finish(&mut guard, Outcome::Exception);
            }
            return *guard;
        }

        if let Some(limit) = settings.timeout {
            if started.elapsed() >= limit {
                let mut guard = outcome.lock();
                if !guard.is_terminal() {
                    info!(waited_secs = limit.as_secs(), "No file moved before the timeout");
                    outcome.finish(&mut guard, Outcome::NotFound);
                }
                return *guard;
            }
        }

        info!("Watching for input file/ Waiting for file to be moved - {}", Local::now().format("%d/%m/%y %H:%M:%S"));
    }
}
