//! Session store: creation and lookup of sessions over a key-value backend.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::backend::{create_backend, KeyValueBackend, Slot};
use crate::config::Config;
use crate::error::{CreateError, Result};
use crate::session::check_and_set::check_and_set;
use crate::session::id::{IdGenerator, RandomIdGenerator, SessionId};
use crate::session::key::storage_key;
use crate::session::record::SessionRecord;

/// Trait for session stores.
pub trait SessionStore: Send + Sync {
    /// Create a session for a user and return its new identifier.
    ///
    /// `user_id` is not validated here. On a collision the returned error
    /// carries the identifier that was attempted.
    fn create(&self, user_id: &str, meta_data: &str) -> std::result::Result<SessionId, CreateError>;

    /// Look up a session.
    ///
    /// Returns `Ok(None)` if no live session exists under the identifier.
    fn find(&self, session_id: &SessionId) -> Result<Option<SessionRecord>>;

    /// Look up a session, reporting "not found" as an empty record.
    ///
    /// Callers treat an empty `user_id` as the not-found signal.
    fn lookup(&self, session_id: &SessionId) -> Result<SessionRecord> {
        Ok(self.find(session_id)?.unwrap_or_default())
    }
}

/// Blanket implementation of SessionStore for Arc-wrapped stores.
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    fn create(&self, user_id: &str, meta_data: &str) -> std::result::Result<SessionId, CreateError> {
        (**self).create(user_id, meta_data)
    }

    fn find(&self, session_id: &SessionId) -> Result<Option<SessionRecord>> {
        (**self).find(session_id)
    }

    fn lookup(&self, session_id: &SessionId) -> Result<SessionRecord> {
        (**self).lookup(session_id)
    }
}

/// Session store over a transactional key-value backend.
///
/// Holds no mutable state: the backend handle is shared and every mutual
/// exclusion decision is made by the backend's transactions.
pub struct KvSessionStore {
    backend: Arc<dyn KeyValueBackend>,
    retention: Duration,
    generator: Box<dyn IdGenerator>,
}

impl KvSessionStore {
    /// Create a store.
    ///
    /// `retention` is the TTL applied to every record; the backend purges
    /// records once it elapses.
    pub fn new(
        backend: Arc<dyn KeyValueBackend>,
        retention: Duration,
        generator: impl IdGenerator + 'static,
    ) -> Self {
        Self {
            backend,
            retention,
            generator: Box::new(generator),
        }
    }

    /// Build a store with the configured backend and a random generator.
    ///
    /// The config is validated first, so an out-of-range value fails here
    /// rather than on every `create`.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let backend = create_backend(&config.backend)?;
        let generator = RandomIdGenerator::with_len(config.generator.id_bytes)?;
        Ok(Self::new(backend, config.retention(), generator))
    }

    pub fn backend(&self) -> &Arc<dyn KeyValueBackend> {
        &self.backend
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }
}

impl std::fmt::Debug for KvSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KvSessionStore")
            .field("backend", &self.backend.name())
            .field("retention", &self.retention)
            .finish()
    }
}

impl SessionStore for KvSessionStore {
    fn create(&self, user_id: &str, meta_data: &str) -> std::result::Result<SessionId, CreateError> {
        let payload = SessionRecord::new(user_id, meta_data).to_payload()?;
        let session_id = self.generator.generate()?;
        let key = storage_key(&session_id);

        match check_and_set(self.backend.as_ref(), &key, &payload, self.retention) {
            Ok(()) => {
                debug!(key = %key, "session created");
                Ok(session_id)
            }
            Err(err) => Err(CreateError::with_session_id(session_id, err)),
        }
    }

    fn find(&self, session_id: &SessionId) -> Result<Option<SessionRecord>> {
        let key = storage_key(session_id);
        match self.backend.get(&key)? {
            Slot::Present(payload) => {
                debug!(key = %key, "session found");
                SessionRecord::from_payload(&payload).map(Some)
            }
            Slot::Absent => {
                debug!(key = %key, "session not found");
                Ok(None)
            }
        }
    }
}
