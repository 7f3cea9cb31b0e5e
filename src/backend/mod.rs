//! Key-value backends for session storage.
//!
//! This module provides the transactional backend traits and the two
//! deployment variants that implement them:
//! - **memory**: single-node in-process store with TTL and watch support
//! - **cluster**: hash-slot routing over a set of shard backends

pub mod factory;
pub mod hash_slot;
pub mod memory;
pub mod sharded;
pub mod traits;

pub use factory::{create_backend, BackendMode};
pub use memory::MemoryBackend;
pub use sharded::ShardedBackend;
pub use traits::{CommitOutcome, KeyValueBackend, Slot, WatchedTransaction};
