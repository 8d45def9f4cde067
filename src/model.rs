use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single bookmark sync record. The `bookmarks` field is ciphertext
/// produced by the client; the server never sees plaintext.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmarks {
    pub id: String,
    pub bookmarks: String,
    pub last_updated: DateTime<Utc>,
    pub version: String,
}

impl Bookmarks {
    /// A record missing any server-assigned field is treated as absent.
    /// Half-written or zero-valued entries can never be observed as valid.
    pub fn is_complete(&self) -> bool {
        !self.id.is_empty()
            && self.last_updated != DateTime::<Utc>::UNIX_EPOCH
            && !self.version.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> Bookmarks {
        Bookmarks {
            id: "a".repeat(32),
            bookmarks: String::new(),
            last_updated: Utc::now(),
            version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn populated_record_is_complete() {
        assert!(record().is_complete());
    }

    #[test]
    fn zero_valued_fields_mark_record_incomplete() {
        let mut b = record();
        b.id = String::new();
        assert!(!b.is_complete());

        let mut b = record();
        b.last_updated = DateTime::<Utc>::UNIX_EPOCH;
        assert!(!b.is_complete());

        let mut b = record();
        b.version = String::new();
        assert!(!b.is_complete());
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let json = serde_json::to_string(&record()).unwrap();
        assert!(json.contains("\"lastUpdated\""));
        assert!(json.contains("\"bookmarks\""));
    }

    #[test]
    fn timestamp_round_trips_with_subsecond_precision() {
        let b = record();
        let json = serde_json::to_string(&b).unwrap();
        let back: Bookmarks = serde_json::from_str(&json).unwrap();
        assert_eq!(back.last_updated, b.last_updated);
    }
}
