//! Error types for session storage.
//!
//! Every failure is surfaced to the immediate caller. Nothing in this crate
//! retries or recovers silently, so the variants below are distinct enough
//! for callers to pick their own policy (for example, regenerating an
//! identifier after a collision).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionId;

/// The main error type for session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The target key was already claimed, or a concurrent writer won the race.
    #[error("session collision on key {key}")]
    Collision { key: String },

    /// The identifier generator failed.
    #[error("generation error: {message}")]
    Generation { message: String },

    /// Transport or backend failure unrelated to a collision.
    #[error("backend error: {message}")]
    Backend { message: String },

    /// Encoding or decoding of the session payload failed.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading or validation errors.
    #[error("config error: {message}")]
    Config { message: String },

    /// I/O errors while reading or writing config files.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A specialized Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

impl SessionError {
    /// Create a collision error for a storage key.
    pub fn collision(key: impl Into<String>) -> Self {
        Self::Collision { key: key.into() }
    }

    /// Create a generation error.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller can recover by retrying with a fresh identifier.
    pub fn is_collision(&self) -> bool {
        matches!(self, Self::Collision { .. })
    }
}

impl From<io::Error> for SessionError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Failure of a create call.
///
/// Once an identifier has been generated it travels with the error, so the
/// caller can see which identifier was attempted even when the write failed.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct CreateError {
    session_id: Option<SessionId>,
    source: SessionError,
}

impl CreateError {
    /// Attach the attempted identifier to an error.
    pub fn with_session_id(session_id: SessionId, source: SessionError) -> Self {
        Self {
            session_id: Some(session_id),
            source,
        }
    }

    /// The identifier that was attempted, if generation got that far.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The underlying error.
    pub fn error(&self) -> &SessionError {
        &self.source
    }

    /// Split into the attempted identifier and the underlying error.
    pub fn into_parts(self) -> (Option<SessionId>, SessionError) {
        (self.session_id, self.source)
    }

    /// Whether the create failed because the key was already claimed.
    pub fn is_collision(&self) -> bool {
        self.source.is_collision()
    }
}

impl From<SessionError> for CreateError {
    fn from(source: SessionError) -> Self {
        Self {
            session_id: None,
            source,
        }
    }
}
