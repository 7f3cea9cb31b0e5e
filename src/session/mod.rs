//! Session creation and lookup.
//!
//! A session is a record (user id plus opaque metadata) stored under a key
//! derived from a freshly generated identifier. Creation goes through the
//! collision-safe [`check_and_set`] protocol; lookup is a plain read.

pub mod check_and_set;
pub mod id;
pub mod key;
pub mod record;
pub mod store;

pub use check_and_set::check_and_set;
pub use id::{IdGenerator, RandomIdGenerator, SessionId, DEFAULT_ID_BYTES, MIN_ID_BYTES};
pub use key::{session_id_from_key, storage_key, KEY_PREFIX};
pub use record::SessionRecord;
pub use store::{KvSessionStore, SessionStore};
