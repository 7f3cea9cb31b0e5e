//! Collision-safe write of a new session record.
//!
//! The key is watched, read, and written only if it was absent, all inside
//! one transaction. If anyone else writes the key between the read and the
//! commit, the commit aborts and the caller sees a collision. There is no
//! retry here: picking a new identifier is the caller's call.

use std::time::Duration;

use tracing::{debug, warn};

use crate::backend::{CommitOutcome, KeyValueBackend, Slot};
use crate::error::{Result, SessionError};

/// Write `payload` under `key` with a TTL, only if `key` is currently absent.
///
/// # Errors
///
/// * `SessionError::Collision` if the key holds a value, or if another writer
///   modified it before the commit.
/// * Any error from the backend read or commit, propagated unchanged.
pub fn check_and_set(
    backend: &dyn KeyValueBackend,
    key: &str,
    payload: &str,
    retention: Duration,
) -> Result<()> {
    let mut tx = backend.watch(key)?;

    match tx.get()? {
        Slot::Present(_) => {
            warn!(key, backend = backend.name(), "session key already claimed");
            return Err(SessionError::collision(key));
        }
        Slot::Absent => {}
    }

    match tx.set_with_ttl(payload, retention)? {
        CommitOutcome::Committed => {
            debug!(key, backend = backend.name(), "session key claimed");
            Ok(())
        }
        CommitOutcome::Aborted => {
            warn!(
                key,
                backend = backend.name(),
                "session key changed during transaction"
            );
            Err(SessionError::collision(key))
        }
    }
}
