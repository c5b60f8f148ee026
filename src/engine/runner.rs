//! Engine thread and notify glue.
//!
//! The notify callback only forwards events into a channel. A dedicated thread
//! owns the `WatchEngine` and sleeps until either an event arrives or the
//! earliest cache deadline passes, whichever comes first.
//!
//! Notes:
//! - Only `Create` events are forwarded; renames into the directory are not creations.
//! - A panic inside event handling is caught here and logged. Expired entries are
//!   additionally guarded one by one in `poll_expired`.

use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::{panic_message, WatchEngine, WatchStop};
use crate::config::WatchSettings;
use crate::errors::WatcherError;
use crate::fs_ops::LockProbe;
use crate::outcome::SharedOutcome;

/// Events delivered to the engine thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    Created(PathBuf),
    Overflow,
    Error(String),
}

struct NotifyWatch {
    watcher: RecommendedWatcher,
    path: PathBuf,
}

impl WatchStop for NotifyWatch {
    fn stop(&mut self) {
        if let Err(e) = self.watcher.unwatch(&self.path) {
            warn!(path = %self.path.display(), error = %e, "failed to unwatch directory");
        } else {
            debug!(path = %self.path.display(), "directory watch stopped");
        }
    }
}

/// Running engine thread.
pub struct WatchHandle {
    thread: JoinHandle<()>,
}

impl WatchHandle {
    /// True once the engine thread has exited (completed or died).
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Arm a non-recursive watch on `settings.watch_path` and start the engine thread.
pub fn spawn<P: LockProbe>(
    settings: &WatchSettings,
    probe: P,
    outcome: Arc<SharedOutcome>,
) -> Result<WatchHandle, WatcherError> {
    if !settings.watch_path.is_dir() {
        return Err(WatcherError::WatchPathNotFound(settings.watch_path.clone()));
    }

    let mut engine = WatchEngine::new(settings, probe, outcome)?;
    let (tx, rx) = mpsc::channel();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| forward(&tx, res),
        NotifyConfig::default(),
    )?;
    watcher.watch(&settings.watch_path, RecursiveMode::NonRecursive)?;
    engine.attach_watcher(Box::new(NotifyWatch {
        watcher,
        path: settings.watch_path.clone(),
    }));
    info!("Watching for input file in folder: {}", settings.watch_path.display());

    let thread = thread::Builder::new()
        .name("watch-engine".into())
        .spawn(move || engine.run(rx))
        .map_err(WatcherError::Thread)?;
    Ok(WatchHandle { thread })
}

fn forward(tx: &Sender<WatchEvent>, res: notify::Result<Event>) {
    // A closed channel means the engine is done; late events are irrelevant.
    match res {
        Ok(event) => {
            if event.need_rescan() {
                let _ = tx.send(WatchEvent::Overflow);
            }
            if let EventKind::Create(_) = event.kind {
                for path in event.paths {
                    let _ = tx.send(WatchEvent::Created(path));
                }
            }
        }
        Err(e) => {
            let _ = tx.send(WatchEvent::Error(e.to_string()));
        }
    }
}

impl<P: LockProbe> WatchEngine<P> {
    /// Decision loop. Returns when the file has been copied or the event source closes.
    pub fn run(mut self, rx: Receiver<WatchEvent>) {
        while !self.is_finished() {
            let next = match self.next_deadline() {
                Some(deadline) => match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(ev) => Some(ev),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(ev) => Some(ev),
                    Err(_) => break,
                },
            };

            if let Some(event) = next {
                self.guarded("event", |engine| engine.dispatch(event));
            }
            self.guarded("expiry", |engine| {
                engine.poll_expired(Instant::now());
            });
        }
        debug!(state = ?self.state(), "engine loop finished");
    }

    fn dispatch(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Created(path) => {
                self.on_created(&path, Instant::now());
            }
            WatchEvent::Overflow => self.on_overflow(),
            WatchEvent::Error(msg) => self.on_watch_error(&msg),
        }
    }

    fn guarded(&mut self, stage: &str, f: impl FnOnce(&mut Self)) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(self))) {
            error!(stage, panic = %panic_message(payload.as_ref()), "unexpected failure in watch engine");
        }
    }
}
