//! Authentication entity records
//!
//! Each record is the JSON shape stored in its blob: bookkeeping fields
//! (`userId`, `createdAt`, ...) plus the caller's arbitrary payload
//! flattened alongside. Tokens and passwords carry a back-reference
//! `userId` so per-user queries can scan their namespace without an
//! index.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time as unix milliseconds
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}

/// A stored user: profile payload plus identity bookkeeping
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Creation timestamp (unix millis)
    #[serde(rename = "createdAt")]
    pub created_at: u64,

    /// Last update timestamp (unix millis); absent until first update
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<u64>,

    /// Arbitrary profile fields (`username`, `email`, ...)
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

/// A stored API token, owned by one user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(rename = "tokenId")]
    pub token_id: String,

    /// Owning user, for reverse scans
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Creation timestamp (unix millis)
    #[serde(rename = "createdAt")]
    pub created_at: u64,

    /// Arbitrary token fields (`apiKey`, `permissions`, ...)
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

/// A stored password entry, owned by one user.
///
/// At most one is active per user by service-level convention; the store
/// enforces it on write, not in this type.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PasswordRecord {
    #[serde(rename = "passwordId")]
    pub password_id: String,

    /// Owning user, for reverse scans
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Creation timestamp (unix millis)
    #[serde(rename = "createdAt")]
    pub created_at: u64,

    /// Arbitrary password fields (`hash`, `salt`, `algorithm`, ...)
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl UserRecord {
    /// Fetch a profile field as a string
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

impl TokenRecord {
    /// Fetch a token field as a string
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_user_record_wire_shape() {
        let record = UserRecord {
            user_id: "user_1".to_string(),
            created_at: 1000,
            updated_at: None,
            attrs: object(json!({"username": "ada", "email": "ada@example.com"})),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], "user_1");
        assert_eq!(value["createdAt"], 1000);
        assert_eq!(value["username"], "ada");
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_user_record_roundtrip() {
        let stored = json!({
            "userId": "user_9",
            "createdAt": 5,
            "username": "grace"
        });

        let record: UserRecord = serde_json::from_value(stored).unwrap();
        assert_eq!(record.user_id, "user_9");
        assert_eq!(record.attr_str("username"), Some("grace"));
    }

    #[test]
    fn test_token_record_back_reference() {
        let stored = json!({
            "tokenId": "token_3",
            "userId": "user_9",
            "createdAt": 5,
            "apiKey": "key-abc"
        });

        let record: TokenRecord = serde_json::from_value(stored).unwrap();
        assert_eq!(record.user_id, "user_9");
        assert_eq!(record.attr_str("apiKey"), Some("key-abc"));
    }
}
