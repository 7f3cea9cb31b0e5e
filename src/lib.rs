//! kvsession - collision-safe session storage over a key-value store
//!
//! Sessions are keyed by a random identifier, stored as a small JSON record
//! with a retention TTL, and written only if no other session already holds
//! the same key. The same write protocol runs against a single node or a
//! hash-slot sharded cluster.

pub mod backend;
pub mod config;
pub mod error;
pub mod session;

pub use backend::{
    create_backend, BackendMode, CommitOutcome, KeyValueBackend, MemoryBackend, ShardedBackend,
    Slot, WatchedTransaction,
};
pub use config::Config;
pub use error::{CreateError, Result, SessionError};
pub use session::{
    check_and_set, session_id_from_key, storage_key, IdGenerator, KvSessionStore,
    RandomIdGenerator, SessionId, SessionRecord, SessionStore,
};
