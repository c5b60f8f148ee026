//! Terminal run result and the cell shared between the orchestrator and the engine.
//!
//! The cell is a single mutex around the current `Outcome` plus a condvar.
//! The engine holds the guard for the whole "copy + stop watching + set outcome"
//! sequence, so the orchestrator's poll loop can never observe a half-finished move.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Result of a run. Only `Pending` is non-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Outcome {
    #[default]
    Pending,
    Success,
    NotFound,
    Exception,
    MissingParams,
}

impl Outcome {
    /// Process exit status for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Outcome::Success => 0,
            Outcome::NotFound | Outcome::Pending => 1,
            Outcome::Exception => -1,
            Outcome::MissingParams => -2,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Outcome::Pending
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Outcome::Pending => "pending",
            Outcome::Success => "success",
            Outcome::NotFound => "not_found",
            Outcome::Exception => "exception",
            Outcome::MissingParams => "missing_params",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
pub struct SharedOutcome {
    state: Mutex<Outcome>,
    changed: Condvar,
}

impl SharedOutcome {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the completion lock. A poisoned lock still yields the last written outcome.
    pub fn lock(&self) -> MutexGuard<'_, Outcome> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a terminal outcome through an already-held guard and wake waiters.
    /// The first terminal outcome wins.
    pub fn finish(&self, guard: &mut MutexGuard<'_, Outcome>, outcome: Outcome) {
        if !guard.is_terminal() {
            **guard = outcome;
        }
        self.changed.notify_all();
    }

    pub fn current(&self) -> Outcome {
        *self.lock()
    }

    /// Block up to `timeout` for a terminal outcome; returns whatever is current afterwards.
    pub fn wait_timeout(&self, timeout: Duration) -> Outcome {
        let guard = self.lock();
        if guard.is_terminal() {
            return *guard;
        }
        match self.changed.wait_timeout(guard, timeout) {
            Ok((g, _)) => *g,
            Err(poisoned) => *poisoned.into_inner().0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn exit_codes_match_contract() {
        assert_eq!(Outcome::Success.exit_code(), 0);
        assert_eq!(Outcome::NotFound.exit_code(), 1);
        assert_eq!(Outcome::Exception.exit_code(), -1);
        assert_eq!(Outcome::MissingParams.exit_code(), -2);
    }

    #[test]
    fn first_terminal_outcome_wins() {
        let cell = SharedOutcome::new();
        {
            let mut g = cell.lock();
            cell.finish(&mut g, Outcome::Success);
        }
        {
            let mut g = cell.lock();
            cell.finish(&mut g, Outcome::Exception);
        }
        assert_eq!(cell.current(), Outcome::Success);
    }

    #[test]
    fn waiter_wakes_early_on_finish() {
        let cell = SharedOutcome::new();
        let writer = Arc::clone(&cell);
        let start = Instant::now();
        let t = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let mut g = writer.lock();
            writer.finish(&mut g, Outcome::Success);
        });
        let mut seen = Outcome::Pending;
        while !seen.is_terminal() {
            seen = cell.wait_timeout(Duration::from_secs(5));
        }
        t.join().unwrap();
        assert_eq!(seen, Outcome::Success);
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
