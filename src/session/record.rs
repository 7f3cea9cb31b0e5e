//! The payload stored under each session key.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// User identity and caller-defined metadata for one session.
///
/// Encoded as a flat JSON object with `userId` and `metaData` fields. There
/// is no version field, so any schema change is a breaking change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionRecord {
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Opaque to this crate; callers pick the encoding.
    #[serde(rename = "metaData")]
    pub meta_data: String,
}

impl SessionRecord {
    pub fn new(user_id: impl Into<String>, meta_data: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            meta_data: meta_data.into(),
        }
    }

    /// True for the record returned when a session does not exist.
    pub fn is_empty(&self) -> bool {
        self.user_id.is_empty() && self.meta_data.is_empty()
    }

    /// Encode the record into its stored form.
    pub fn to_payload(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| SessionError::serde(format!("encoding session record: {}", e)))
    }

    /// Decode a stored payload.
    pub fn from_payload(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| SessionError::serde(format!("decoding session record: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_field_names() {
        let record = SessionRecord::new("me", "meta");
        assert_eq!(
            record.to_payload().unwrap(),
            r#"{"userId":"me","metaData":"meta"}"#
        );
    }

    #[test]
    fn test_decode_payload() {
        let record = SessionRecord::from_payload(r#"{"userId":"u1","metaData":"{\"a\":1}"}"#)
            .unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.meta_data, r#"{"a":1}"#);
    }

    #[test]
    fn test_decode_missing_fields_defaults_to_empty() {
        let record = SessionRecord::from_payload(r#"{"userId":"u1"}"#).unwrap();
        assert_eq!(record.user_id, "u1");
        assert_eq!(record.meta_data, "");

        let record = SessionRecord::from_payload("{}").unwrap();
        assert!(record.is_empty());
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let record =
            SessionRecord::from_payload(r#"{"userId":"u1","metaData":"","extra":true}"#).unwrap();
        assert_eq!(record.user_id, "u1");
    }

    #[test]
    fn test_decode_html_escaped_payload() {
        // Older writers escaped <, > and & as unicode sequences.
        let record =
            SessionRecord::from_payload(r#"{"userId":"a\u0026b","metaData":"\u003cx\u003e"}"#)
                .unwrap();
        assert_eq!(record.user_id, "a&b");
        assert_eq!(record.meta_data, "<x>");
    }

    #[test]
    fn test_decode_invalid_payload() {
        let err = SessionRecord::from_payload("not json").unwrap_err();
        assert!(matches!(err, SessionError::Serde { .. }));
        assert!(err.to_string().contains("decoding session record"));
    }

    #[test]
    fn test_decode_wrong_field_type() {
        let err = SessionRecord::from_payload(r#"{"userId":42}"#).unwrap_err();
        assert!(matches!(err, SessionError::Serde { .. }));
    }

    #[test]
    fn test_default_is_empty() {
        assert!(SessionRecord::default().is_empty());
        assert!(!SessionRecord::new("me", "").is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // Property: encode then decode preserves both fields
            #[test]
            fn prop_payload_is_lossless(user_id in ".*", meta_data in ".*") {
                let record = SessionRecord::new(user_id, meta_data);
                let decoded = SessionRecord::from_payload(&record.to_payload().unwrap()).unwrap();
                prop_assert_eq!(decoded, record);
            }
        }
    }
}
