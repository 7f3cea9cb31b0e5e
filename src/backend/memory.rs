//! In-process single-node backend.
//!
//! Thread-safe key-value map with per-entry expiry and watch support. Every
//! write stamps the entry with a fresh revision from a store-wide counter; a
//! watch remembers the revision it saw and its commit aborts if the key's
//! revision has moved since.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use crate::backend::traits::{CommitOutcome, KeyValueBackend, Slot, WatchedTransaction};
use crate::error::{Result, SessionError};

#[derive(Debug)]
struct Entry {
    value: String,
    revision: u64,
    /// `None` when the TTL overflowed the clock.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Writes between automatic sweeps of expired entries.
const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    last_revision: u64,
}

impl Inner {
    fn live(&self, key: &str, now: Instant) -> Option<&Entry> {
        self.entries.get(key).filter(|e| e.is_live(now))
    }

    /// Revision of the key as a watcher sees it; 0 means absent.
    fn revision(&self, key: &str, now: Instant) -> u64 {
        self.live(key, now).map_or(0, |e| e.revision)
    }

    fn slot(&self, key: &str, now: Instant) -> Slot {
        match self.live(key, now) {
            Some(entry) => Slot::Present(entry.value.clone()),
            None => Slot::Absent,
        }
    }

    fn insert(&mut self, key: &str, value: &str, ttl: Duration, now: Instant) {
        self.last_revision += 1;
        if self.last_revision % SWEEP_INTERVAL == 0 {
            let removed = self.sweep(now);
            if removed > 0 {
                tracing::debug!(removed, "swept expired entries");
            }
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                revision: self.last_revision,
                expires_at: now.checked_add(ttl),
            },
        );
    }

    /// Drop expired entries, returning how many were removed.
    fn sweep(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.is_live(now));
        before - self.entries.len()
    }
}

/// In-memory single-node backend.
///
/// Expired entries are invisible to reads immediately. Their memory is
/// reclaimed by a sweep every `SWEEP_INTERVAL` writes, by
/// [`MemoryBackend::purge_expired`], or by being overwritten.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: RwLock<Inner>,
}

impl MemoryBackend {
    /// Create a new empty backend.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| SessionError::backend("memory backend lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| SessionError::backend("memory backend lock poisoned"))
    }

    /// Unconditionally write a value with a TTL, bumping the key's revision.
    ///
    /// Any open watch on `key` will abort on commit.
    pub fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        validate_ttl(ttl)?;
        self.write()?.insert(key, value, ttl, Instant::now());
        Ok(())
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner.entries.values().filter(|e| e.is_live(now)).count()
    }

    /// Check if the backend holds no live entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop expired entries. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize> {
        Ok(self.write()?.sweep(Instant::now()))
    }

    /// Remove every entry.
    pub fn flush_all(&self) -> Result<()> {
        self.write()?.entries.clear();
        Ok(())
    }
}

fn validate_ttl(ttl: Duration) -> Result<()> {
    if ttl.is_zero() {
        return Err(SessionError::backend("invalid expire time: TTL must be positive"));
    }
    Ok(())
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Slot> {
        Ok(self.read()?.slot(key, Instant::now()))
    }

    fn watch(&self, key: &str) -> Result<Box<dyn WatchedTransaction + '_>> {
        let revision = self.read()?.revision(key, Instant::now());
        Ok(Box::new(MemoryTransaction {
            backend: self,
            key: key.to_string(),
            revision,
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

struct MemoryTransaction<'a> {
    backend: &'a MemoryBackend,
    key: String,
    revision: u64,
}

impl WatchedTransaction for MemoryTransaction<'_> {
    fn key(&self) -> &str {
        &self.key
    }

    fn get(&mut self) -> Result<Slot> {
        self.backend.get(&self.key)
    }

    fn set_with_ttl(self: Box<Self>, value: &str, ttl: Duration) -> Result<CommitOutcome> {
        validate_ttl(ttl)?;
        let now = Instant::now();
        let mut inner = self.backend.write()?;
        if inner.revision(&self.key, now) != self.revision {
            return Ok(CommitOutcome::Aborted);
        }
        inner.insert(&self.key, value, ttl, now);
        Ok(CommitOutcome::Committed)
    }
}
