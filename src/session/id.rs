//! Session identifiers and the generators that mint them.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::TryRngCore;

use crate::error::{Result, SessionError};

/// Default identifier length in bytes (256 bits).
pub const DEFAULT_ID_BYTES: usize = 32;

/// Shortest identifier `RandomIdGenerator` will produce (128 bits).
pub const MIN_ID_BYTES: usize = 16;

/// An opaque session identifier.
///
/// The store never interprets the bytes; it only maps them to a storage key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Vec<u8>);

impl SessionId {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64 form, the same text used inside storage keys.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.0)
    }
}

impl From<Vec<u8>> for SessionId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for SessionId {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl AsRef<[u8]> for SessionId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

// Identifiers are bearer credentials; keep them out of debug logs.
impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({} bytes)", self.0.len())
    }
}

/// Source of candidate session identifiers.
///
/// Implementations must produce identifiers with negligible collision
/// probability and enough entropy to resist guessing. Any closure of the
/// right shape is a generator, which keeps stubs short in tests.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<SessionId>;
}

impl<F> IdGenerator for F
where
    F: Fn() -> Result<SessionId> + Send + Sync,
{
    fn generate(&self) -> Result<SessionId> {
        self()
    }
}

/// Generator backed by the operating system's entropy source.
#[derive(Debug, Clone)]
pub struct RandomIdGenerator {
    len: usize,
}

impl RandomIdGenerator {
    /// Create a generator producing `DEFAULT_ID_BYTES`-byte identifiers.
    pub fn new() -> Self {
        Self {
            len: DEFAULT_ID_BYTES,
        }
    }

    /// Create a generator with a custom identifier length.
    ///
    /// Lengths below `MIN_ID_BYTES` are rejected.
    pub fn with_len(len: usize) -> Result<Self> {
        if len < MIN_ID_BYTES {
            return Err(SessionError::config(format!(
                "identifier length {} is below the minimum of {} bytes",
                len, MIN_ID_BYTES
            )));
        }
        Ok(Self { len })
    }

    /// Length in bytes of the identifiers this generator produces.
    pub fn id_len(&self) -> usize {
        self.len
    }
}

impl Default for RandomIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> Result<SessionId> {
        let mut bytes = vec![0u8; self.len];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| SessionError::generation(format!("OS entropy source failed: {}", e)))?;
        Ok(SessionId(bytes))
    }
}
