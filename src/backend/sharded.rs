//! Clustered backend.
//!
//! Wraps a fixed set of shard backends and routes every key to the shard
//! owning its hash slot. Transactions run entirely on the owning shard, so
//! the write protocol is unchanged from the single-node case.

use crate::backend::hash_slot::{key_slot, shard_for_slot};
use crate::backend::memory::MemoryBackend;
use crate::backend::traits::{KeyValueBackend, Slot, WatchedTransaction};
use crate::error::{Result, SessionError};

/// A backend that spreads keys across shards by hash slot.
pub struct ShardedBackend {
    shards: Vec<Box<dyn KeyValueBackend>>,
}

impl ShardedBackend {
    /// Create a clustered backend over the given shards.
    ///
    /// Shard order defines slot ownership: shard `i` owns the `i`-th
    /// contiguous range of slots.
    pub fn new(shards: Vec<Box<dyn KeyValueBackend>>) -> Result<Self> {
        if shards.is_empty() {
            return Err(SessionError::config(
                "clustered backend needs at least one shard",
            ));
        }
        Ok(Self { shards })
    }

    /// Create a clustered backend of `count` in-memory shards.
    pub fn in_memory(count: usize) -> Result<Self> {
        let shards = (0..count)
            .map(|_| Box::new(MemoryBackend::new()) as Box<dyn KeyValueBackend>)
            .collect();
        Self::new(shards)
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`.
    pub fn shard_for_key(&self, key: &str) -> usize {
        shard_for_slot(key_slot(key), self.shards.len())
    }

    fn route(&self, key: &str) -> &dyn KeyValueBackend {
        self.shards[self.shard_for_key(key)].as_ref()
    }
}

impl std::fmt::Debug for ShardedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedBackend")
            .field("shards", &self.shards.len())
            .finish()
    }
}

impl KeyValueBackend for ShardedBackend {
    fn get(&self, key: &str) -> Result<Slot> {
        self.route(key).get(key)
    }

    fn watch(&self, key: &str) -> Result<Box<dyn WatchedTransaction + '_>> {
        self.route(key).watch(key)
    }

    fn name(&self) -> &'static str {
        "cluster"
    }

    fn ping(&self) -> bool {
        self.shards.iter().all(|shard| shard.ping())
    }
}
