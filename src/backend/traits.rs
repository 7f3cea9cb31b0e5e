//! Key-value backend traits.
//!
//! A backend is anything that can watch a single key, read it inside that
//! watch, and commit a write with a time-to-live only if the key was not
//! touched in between. Single-node and clustered deployments implement the
//! same traits; they differ in routing, never in the write protocol.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

/// Outcome of a read: the stored value or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Present(String),
    Absent,
}

impl Slot {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Convert into an `Option`, dropping the tag.
    pub fn into_value(self) -> Option<String> {
        match self {
            Self::Present(value) => Some(value),
            Self::Absent => None,
        }
    }
}

/// Result of committing a watched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The write was applied.
    Committed,
    /// The watched key changed after the watch began; nothing was written.
    Aborted,
}

/// Trait for transactional key-value backends.
///
/// Implementations must be thread-safe: one handle is shared by every
/// concurrent caller.
pub trait KeyValueBackend: Send + Sync {
    /// Plain read outside any transaction.
    fn get(&self, key: &str) -> Result<Slot>;

    /// Begin a transaction that watches `key` for changes.
    ///
    /// Any write to `key` by another client between this call and
    /// [`WatchedTransaction::set_with_ttl`] makes the commit abort.
    fn watch(&self, key: &str) -> Result<Box<dyn WatchedTransaction + '_>>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;

    /// Health check.
    fn ping(&self) -> bool {
        true
    }
}

/// A transaction scoped to one watched key.
///
/// Dropping the transaction without committing discards it.
pub trait WatchedTransaction {
    /// The watched key.
    fn key(&self) -> &str;

    /// Read the watched key inside the transaction.
    fn get(&mut self) -> Result<Slot>;

    /// Write `value` with a time-to-live and commit.
    ///
    /// Returns `CommitOutcome::Aborted` if the watched key was modified
    /// since the watch began.
    fn set_with_ttl(self: Box<Self>, value: &str, ttl: Duration) -> Result<CommitOutcome>;
}

/// Blanket implementation of KeyValueBackend for Arc-wrapped backends.
impl<T: KeyValueBackend + ?Sized> KeyValueBackend for Arc<T> {
    fn get(&self, key: &str) -> Result<Slot> {
        (**self).get(key)
    }

    fn watch(&self, key: &str) -> Result<Box<dyn WatchedTransaction + '_>> {
        (**self).watch(key)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn ping(&self) -> bool {
        (**self).ping()
    }
}
