//! The engine decision loop, fed through its event channel instead of a live watcher.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use assert_fs::prelude::*;
use file_watcher::{LockProbe, LockStatus, Outcome, SharedOutcome, WatchEngine, WatchEvent, WatchSettings};

/// Panics on its first call, then reports every file as free.
#[derive(Clone, Default)]
struct PanicOnce {
    calls: Arc<AtomicUsize>,
}

impl LockProbe for PanicOnce {
    fn probe(&self, _path: &Path) -> LockStatus {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("probe blew up");
        }
        LockStatus::Unlocked
    }
}

fn wait_terminal(outcome: &SharedOutcome, limit: Duration) -> Outcome {
    let start = Instant::now();
    loop {
        let current = outcome.wait_timeout(Duration::from_millis(100));
        if current.is_terminal() || start.elapsed() > limit {
            return current;
        }
    }
}

fn settings(watch: &Path, dest: &Path) -> WatchSettings {
    let mut s = WatchSettings::new(watch, "*.dat", dest, Duration::from_millis(50));
    s.cache_ttl = Duration::from_millis(100);
    s.log_file = None;
    s
}

#[test]
fn loop_survives_a_panicking_probe_and_completes_later() {
    let temp = assert_fs::TempDir::new().unwrap();
    let watch = temp.child("in");
    let dest = temp.child("out");
    watch.create_dir_all().unwrap();
    dest.create_dir_all().unwrap();
    let first = watch.child("first.dat");
    let second = watch.child("second.dat");
    first.write_str("1").unwrap();
    second.write_str("22").unwrap();

    let probe = PanicOnce::default();
    let outcome = SharedOutcome::new();
    let engine = WatchEngine::new(&settings(watch.path(), dest.path()), probe.clone(), Arc::clone(&outcome)).unwrap();
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || engine.run(rx));

    tx.send(WatchEvent::Created(first.path().to_path_buf())).unwrap();
    thread::sleep(Duration::from_millis(400));
    assert_eq!(outcome.current(), Outcome::Pending, "panic must not end the run");
    assert!(!worker.is_finished());

    tx.send(WatchEvent::Overflow).unwrap();
    tx.send(WatchEvent::Error("backend hiccup".into())).unwrap();
    tx.send(WatchEvent::Created(second.path().to_path_buf())).unwrap();
    assert_eq!(wait_terminal(&outcome, Duration::from_secs(5)), Outcome::Success);

    worker.join().unwrap();
    assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    dest.child("second.dat").assert("22");
    assert!(!dest.child("first.dat").path().exists());
}

#[test]
fn panic_on_one_due_entry_leaves_its_batch_siblings_alone() {
    let temp = assert_fs::TempDir::new().unwrap();
    let watch = temp.child("in");
    let dest = temp.child("out");
    watch.create_dir_all().unwrap();
    dest.create_dir_all().unwrap();
    let a = watch.child("a.dat");
    let b = watch.child("b.dat");
    a.write_str("a").unwrap();
    b.write_str("b").unwrap();

    let probe = PanicOnce::default();
    let outcome = SharedOutcome::new();
    let mut engine = WatchEngine::new(&settings(watch.path(), dest.path()), probe.clone(), Arc::clone(&outcome)).unwrap();
    let armed = Instant::now();
    assert!(engine.on_created(a.path(), armed));
    assert!(engine.on_created(b.path(), armed));

    let (tx, rx) = mpsc::channel::<WatchEvent>();
    let worker = thread::spawn(move || engine.run(rx));
    assert_eq!(wait_terminal(&outcome, Duration::from_secs(5)), Outcome::Success);
    worker.join().unwrap();
    drop(tx);

    // Same deadline: a.dat is checked first and its check panics; b.dat is still checked.
    assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    dest.child("b.dat").assert("b");
    assert!(!dest.child("a.dat").path().exists());
}

#[test]
fn loop_returns_when_event_source_closes() {
    let temp = assert_fs::TempDir::new().unwrap();
    let watch = temp.child("in");
    let dest = temp.child("out");
    watch.create_dir_all().unwrap();
    dest.create_dir_all().unwrap();

    let outcome = SharedOutcome::new();
    let engine = WatchEngine::new(&settings(watch.path(), dest.path()), PanicOnce::default(), Arc::clone(&outcome)).unwrap();
    let (tx, rx) = mpsc::channel::<WatchEvent>();
    let worker = thread::spawn(move || engine.run(rx));
    drop(tx);

    worker.join().unwrap();
    assert_eq!(outcome.current(), Outcome::Pending);
}
