//! Pending-file cache with a deadline per entry.
//!
//! Each entry gets its own countdown starting at its own detection time, so how
//! often a specific file is checked is independent of how often the orchestrator
//! wakes up. The cache is a passive delay queue: the engine's decision thread asks
//! for `next_deadline()`, sleeps until then, and calls `take_expired(now)`.
//!
//! Only entries handed out by `take_expired` count as "expired". `remove` and
//! `clear` are explicit removals and never feed the retry/move logic.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// One detected candidate file awaiting a safe transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    /// Cache key; the bare file name.
    pub name: String,
    /// Absolute source path.
    pub full_path: PathBuf,
    /// Number of times the lock check has failed so far.
    pub retry_count: u32,
}

impl PendingFile {
    pub fn new(name: impl Into<String>, full_path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            full_path: full_path.into(),
            retry_count: 0,
        }
    }
}

#[derive(Debug)]
struct Slot {
    file: PendingFile,
    deadline: Instant,
}

#[derive(Debug, Default)]
pub struct ExpiringRetryCache {
    entries: HashMap<String, Slot>,
}

impl ExpiringRetryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `file` with a deadline of `now + ttl` unless an entry with the same
    /// name is live. Returns true if inserted; the existing entry is never replaced.
    pub fn add_if_absent(&mut self, file: PendingFile, ttl: Duration, now: Instant) -> bool {
        if self.entries.contains_key(&file.name) {
            return false;
        }
        let deadline = now + ttl;
        self.entries.insert(file.name.clone(), Slot { file, deadline });
        true
    }

    /// Re-arm an entry that just expired: bump its retry count, then give it a fresh deadline.
    /// Returns the new retry count.
    pub fn reinsert(&mut self, mut file: PendingFile, ttl: Duration, now: Instant) -> u32 {
        file.retry_count += 1;
        let retries = file.retry_count;
        let deadline = now + ttl;
        self.entries.insert(file.name.clone(), Slot { file, deadline });
        retries
    }

    /// Remove and return every entry whose deadline is at or before `now`, earliest first.
    pub fn take_expired(&mut self, now: Instant) -> Vec<PendingFile> {
        let mut due: Vec<(Instant, String)> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.deadline <= now)
            .map(|(name, slot)| (slot.deadline, name.clone()))
            .collect();
        due.sort();
        due.into_iter()
            .filter_map(|(_, name)| self.entries.remove(&name).map(|slot| slot.file))
            .collect()
    }

    /// Earliest deadline among live entries.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries.values().map(|slot| slot.deadline).min()
    }

    /// Explicit removal; the entry is not treated as expired.
    pub fn remove(&mut self, name: &str) -> Option<PendingFile> {
        self.entries.remove(name).map(|slot| slot.file)
    }

    /// Drop every entry without treating any as expired (used on completion).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, name: &str) -> Option<&PendingFile> {
        self.entries.get(name).map(|slot| &slot.file)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(1);

    fn pf(name: &str) -> PendingFile {
        PendingFile::new(name, format!("/watch/{name}"))
    }

    #[test]
    fn duplicate_insert_keeps_original_entry() {
        let mut cache = ExpiringRetryCache::new();
        let t0 = Instant::now();
        assert!(cache.add_if_absent(pf("a.csv"), TTL, t0));

        let mut other = PendingFile::new("a.csv", "/elsewhere/a.csv");
        other.retry_count = 7;
        assert!(!cache.add_if_absent(other, TTL, t0 + Duration::from_millis(500)));

        assert_eq!(cache.len(), 1);
        let kept = cache.get("a.csv").unwrap();
        assert_eq!(kept.full_path, PathBuf::from("/watch/a.csv"));
        assert_eq!(kept.retry_count, 0);
        // deadline is still the first one
        assert_eq!(cache.next_deadline(), Some(t0 + TTL));
    }

    #[test]
    fn nothing_expires_before_deadline() {
        let mut cache = ExpiringRetryCache::new();
        let t0 = Instant::now();
        cache.add_if_absent(pf("a.csv"), TTL, t0);
        assert!(cache.take_expired(t0 + Duration::from_millis(999)).is_empty());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn expired_entries_are_removed_and_returned_in_deadline_order() {
        let mut cache = ExpiringRetryCache::new();
        let t0 = Instant::now();
        cache.add_if_absent(pf("late"), Duration::from_secs(3), t0);
        cache.add_if_absent(pf("early"), Duration::from_secs(1), t0);
        cache.add_if_absent(pf("middle"), Duration::from_secs(2), t0);

        let names: Vec<_> = cache
            .take_expired(t0 + Duration::from_secs(2))
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["early", "middle"]);
        assert!(cache.contains("late"));
        assert!(!cache.contains("early"));
    }

    #[test]
    fn reinsert_bumps_retry_count_by_one_and_rearms() {
        let mut cache = ExpiringRetryCache::new();
        let t0 = Instant::now();
        cache.add_if_absent(pf("a.csv"), TTL, t0);
        let expired = cache.take_expired(t0 + TTL).pop().unwrap();

        let t1 = t0 + TTL;
        assert_eq!(cache.reinsert(expired, TTL, t1), 1);
        assert_eq!(cache.get("a.csv").unwrap().retry_count, 1);
        assert_eq!(cache.next_deadline(), Some(t1 + TTL));
        assert!(cache.take_expired(t1 + Duration::from_millis(10)).is_empty());
    }

    #[test]
    fn explicit_removal_does_not_count_as_expiry() {
        let mut cache = ExpiringRetryCache::new();
        let t0 = Instant::now();
        cache.add_if_absent(pf("a.csv"), TTL, t0);
        cache.add_if_absent(pf("b.csv"), TTL, t0);

        assert!(cache.remove("a.csv").is_some());
        cache.clear();
        assert!(cache.take_expired(t0 + TTL * 10).is_empty());
        assert!(cache.is_empty());
        assert_eq!(cache.next_deadline(), None);
    }
}
