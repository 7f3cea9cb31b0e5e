//! Storage key derivation.
//!
//! Keys are `"session-"` followed by the standard (padded) base64 encoding
//! of the raw identifier bytes. This format is shared with records written by
//! earlier deployments and must not change.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::session::SessionId;

/// Namespace tag prepended to every session key.
pub const KEY_PREFIX: &str = "session-";

/// Derive the storage key for a session identifier.
pub fn storage_key(session_id: &SessionId) -> String {
    format!("{}{}", KEY_PREFIX, STANDARD.encode(session_id.as_bytes()))
}

/// Recover the identifier from a storage key.
///
/// Returns `None` for keys outside the session namespace or with a body that
/// is not valid base64.
pub fn session_id_from_key(key: &str) -> Option<SessionId> {
    let encoded = key.strip_prefix(KEY_PREFIX)?;
    STANDARD.decode(encoded).ok().map(SessionId::from)
}
