//! Watch engine: the decision logic behind a directory watch.
//!
//! State machine per watched directory:
//!   Idle -> PendingCheck -> Completed (terminal; file copied, watch stopped)
//!                        -> Exhausted (retries used up; watcher stays armed)
//!
//! Everything here runs on the engine's single decision thread (see `runner`).
//! Creation events and cache expirations are both handled through `&mut self`,
//! so the per-name absent check and the insert can never interleave.
//!
//! Lock-check budget for one entry: `max_retries + 1` probes, `max_retries` re-arms.

mod runner;

pub use runner::{spawn, WatchEvent, WatchHandle};

use globset::GlobMatcher;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::cache::{ExpiringRetryCache, PendingFile};
use crate::config::{compile_filter, WatchSettings};
use crate::errors::WatcherError;
use crate::fs_ops::{copy_into_destination, LockProbe, LockStatus};
use crate::outcome::{Outcome, SharedOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Watching, nothing pending.
    Idle,
    /// At least one detected file is waiting for its next lock check.
    PendingCheck,
    /// File copied; watch stopped.
    Completed,
    /// The last pending file ran out of retries; still watching for new files.
    Exhausted,
}

/// Something that can be told to stop delivering events (the notify watcher).
pub trait WatchStop: Send {
    fn stop(&mut self);
}

/// What the engine did with one expired entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    Rearmed { retries: u32 },
    Copied { dest: PathBuf },
    GaveUp,
    Abandoned,
}

pub struct WatchEngine<P: LockProbe> {
    matcher: GlobMatcher,
    destination: PathBuf,
    ttl: Duration,
    max_retries: u32,
    cache: ExpiringRetryCache,
    probe: P,
    outcome: Arc<SharedOutcome>,
    watcher: Option<Box<dyn WatchStop>>,
    state: EngineState,
}

impl<P: LockProbe> WatchEngine<P> {
    pub fn new(settings: &WatchSettings, probe: P, outcome: Arc<SharedOutcome>) -> Result<Self, WatcherError> {
        let matcher = compile_filter(&settings.file_filter)?;
        Ok(Self {
            matcher,
            destination: settings.destination.clone(),
            ttl: settings.cache_ttl,
            max_retries: settings.max_retries,
            cache: ExpiringRetryCache::new(),
            probe,
            outcome,
            watcher: None,
            state: EngineState::Idle,
        })
    }

    /// Hand the engine the live watcher so it can be stopped on completion.
    pub fn attach_watcher(&mut self, watcher: Box<dyn WatchStop>) {
        self.watcher = Some(watcher);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state == EngineState::Completed
    }

    pub fn cache(&self) -> &ExpiringRetryCache {
        &self.cache
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.cache.next_deadline()
    }

    /// A file appeared in the watched directory. Returns true if a new entry was armed.
    pub fn on_created(&mut self, path: &Path, now: Instant) -> bool {
        if self.is_finished() {
            return false;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            debug!(path = %path.display(), "ignoring event without a UTF-8 file name");
            return false;
        };
        if !self.matcher.is_match(name) {
            debug!(name, "ignoring file that does not match the filter");
            return false;
        }
        if path.is_dir() {
            debug!(path = %path.display(), "ignoring directory");
            return false;
        }

        let file = PendingFile::new(name, path);
        if self.cache.add_if_absent(file, self.ttl, now) {
            self.state = EngineState::PendingCheck;
            info!(path = %path.display(), "File found");
            true
        } else {
            debug!(name, "duplicate creation event; entry already pending");
            false
        }
    }

    /// Process every entry whose deadline has passed. A panic while handling one
    /// entry abandons that entry only; the rest of the batch is still handled.
    pub fn poll_expired(&mut self, now: Instant) -> Vec<Expiry> {
        let mut results = Vec::new();
        for file in self.cache.take_expired(now) {
            if self.is_finished() {
                break;
            }
            let name = file.name.clone();
            let result = panic::catch_unwind(AssertUnwindSafe(|| self.on_expired(file, now)))
                .unwrap_or_else(|payload| {
                    error!(name = %name, panic = %panic_message(payload.as_ref()), "unexpected failure while checking file; abandoning it");
                    Expiry::Abandoned
                });
            results.push(result);
        }
        if !self.is_finished() && !results.is_empty() && self.cache.is_empty() {
            self.state = EngineState::Exhausted;
        }
        results
    }

    /// Decide what to do with one expired entry: re-arm, copy, or drop it.
    pub fn on_expired(&mut self, file: PendingFile, now: Instant) -> Expiry {
        if file.retry_count > self.max_retries {
            warn!(name = %file.name, retries = file.retry_count, "retry budget exceeded; dropping entry");
            return Expiry::GaveUp;
        }

        match self.probe.probe(&file.full_path) {
            LockStatus::Locked if file.retry_count < self.max_retries => {
                let retries = self.cache.reinsert(file, self.ttl, now);
                info!(retries, "File is locked, waiting to move the file");
                Expiry::Rearmed { retries }
            }
            LockStatus::Locked => {
                warn!(
                    name = %file.name,
                    checks = file.retry_count + 1,
                    "File still locked after all retries; giving up on it"
                );
                Expiry::GaveUp
            }
            LockStatus::Failed(kind) => {
                error!(name = %file.name, path = %file.full_path.display(), ?kind, "lock check failed; abandoning file");
                Expiry::Abandoned
            }
            LockStatus::Unlocked => self.complete(file),
        }
    }

    /// Copy, stop watching and publish Success, all under the completion lock.
    fn complete(&mut self, file: PendingFile) -> Expiry {
        let outcome = Arc::clone(&self.outcome);
        let mut guard = outcome.lock();
        if guard.is_terminal() {
            debug!(outcome = %*guard, "run already finished; not copying");
            return Expiry::Abandoned;
        }

        info!(name = %file.name, "Ready to move file");
        match copy_into_destination(&file.full_path, &self.destination, &file.name) {
            Ok(report) => {
                if let Some(mut w) = self.watcher.take() {
                    w.stop();
                }
                self.cache.clear();
                self.state = EngineState::Completed;
                outcome.finish(&mut guard, Outcome::Success);
                info!(dest = %report.dest.display(), bytes = report.bytes, "File moved");
                Expiry::Copied { dest: report.dest }
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, name = %file.name, "copy failed; abandoning file");
                Expiry::Abandoned
            }
        }
    }

    /// Watch-subsystem problems are logged; watching continues.
    pub fn on_watch_error(&self, message: &str) {
        error!("The file system watcher has detected an error: {message}");
    }

    /// The backend dropped events and asked for a rescan. Missed creations are not replayed.
    pub fn on_overflow(&self) {
        error!("The file system watcher experienced an internal buffer overflow; some events may have been missed");
    }
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct CountingProbe {
        calls: Arc<AtomicUsize>,
    }

    impl LockProbe for CountingProbe {
        fn probe(&self, _path: &Path) -> LockStatus {
            self.calls.fetch_add(1, Ordering::SeqCst);
            LockStatus::Unlocked
        }
    }

    fn engine(max_retries: u32) -> (WatchEngine<CountingProbe>, CountingProbe) {
        let mut settings = WatchSettings::new("/watch", "*.dat", "/dest", Duration::from_millis(100));
        settings.max_retries = max_retries;
        let probe = CountingProbe::default();
        let engine = WatchEngine::new(&settings, probe.clone(), SharedOutcome::new()).unwrap();
        (engine, probe)
    }

    #[test]
    fn entry_past_its_budget_is_dropped_without_probing() {
        let (mut engine, probe) = engine(2);
        let mut file = PendingFile::new("late.dat", "/watch/late.dat");
        file.retry_count = 3;

        assert_eq!(engine.on_expired(file, Instant::now()), Expiry::GaveUp);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0);
        assert!(engine.cache().is_empty());
    }

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let s: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(s.as_ref()), "boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(owned.as_ref()), "bang");
        let other: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(other.as_ref()), "unknown panic");
    }
}
