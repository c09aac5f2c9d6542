//! Identifier derivation from content hashes
//!
//! Three derivation modes, all built on BLAKE3:
//!
//! - [`generate_id`] salts the content with the current time, so every
//!   call yields a fresh string id
//! - [`id_to_number`] deterministically folds a string id into a numeric
//!   link endpoint
//! - [`generate_item_id`] hashes canonicalized content with no salt, so
//!   identical content always yields the same id
//!
//! None of these are collision-free: the numeric forms truncate a 256-bit
//! digest to 64 bits, and nothing checks for collisions downstream.

use crate::model::strip_children;
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

/// Width of the hex prefix folded into the numeric part of a generated id
const GENERATED_ID_HEX_WIDTH: usize = 12;

/// Serialize a value in canonical form.
///
/// `serde_json::Map` iterates keys in sorted order, so rendering through
/// `Value` yields the same string regardless of the key order the caller
/// built the document with.
pub fn canonical_json(value: &Value) -> String {
    value.to_string()
}

/// Derive a fresh string id from content plus the current time.
///
/// The digest is salted with a nanosecond timestamp, so repeated calls
/// with identical content yield different ids. Uniqueness is
/// probabilistic, not checked. A non-empty `prefix` namespaces the id
/// (`"user_123456"`); an empty prefix yields the bare number.
pub fn generate_id(content: &Value, prefix: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();

    let mut hasher = blake3::Hasher::new();
    hasher.update(canonical_json(content).as_bytes());
    hasher.update(&now.to_le_bytes());
    let digest = hasher.finalize();

    let hex_digest = hex::encode(digest.as_bytes());
    let numeric = u64::from_str_radix(&hex_digest[..GENERATED_ID_HEX_WIDTH], 16)
        .expect("digest prefix is valid hexadecimal");

    if prefix.is_empty() {
        numeric.to_string()
    } else {
        format!("{}_{}", prefix, numeric)
    }
}

/// Fold a string id into a numeric link endpoint.
///
/// Deterministic: the same id always folds to the same number. The full
/// first eight bytes of the digest are used, so the only collision
/// surface is the 64-bit truncation itself; collisions are not detected.
pub fn id_to_number(id: &str) -> u64 {
    let digest = blake3::hash(id.as_bytes());
    u64::from_le_bytes(digest.as_bytes()[..8].try_into().unwrap())
}

/// Derive a content-stable numeric id for a tree node.
///
/// Children are stripped and the remainder canonicalized before hashing,
/// and there is no time salt: identical content yields the same id on
/// every call. This is what turns re-storing a node into an upsert
/// instead of a duplicate.
pub fn generate_item_id(item: &Value) -> u64 {
    let stripped = strip_children(item);
    let digest = blake3::hash(canonical_json(&stripped).as_bytes());
    u64::from_le_bytes(digest.as_bytes()[..8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_id_salted() {
        let content = json!({"username": "ada"});
        let a = generate_id(&content, "user");
        let b = generate_id(&content, "user");
        assert_ne!(a, b);
        assert!(a.starts_with("user_"));
    }

    #[test]
    fn test_generate_id_without_prefix() {
        let id = generate_id(&json!({"k": 1}), "");
        assert!(id.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_id_to_number_deterministic() {
        let a = id_to_number("user_12345");
        let b = id_to_number("user_12345");
        assert_eq!(a, b);
        assert_ne!(a, id_to_number("user_12346"));
    }

    #[test]
    fn test_generate_item_id_content_stable() {
        let a = json!({"label": "Home", "icon": "house"});
        let b = json!({"icon": "house", "label": "Home"});
        assert_eq!(generate_item_id(&a), generate_item_id(&b));
    }

    #[test]
    fn test_generate_item_id_ignores_children() {
        let leaf = json!({"label": "Home"});
        let branch = json!({"label": "Home", "items": [{"label": "Sub"}]});
        assert_eq!(generate_item_id(&leaf), generate_item_id(&branch));
    }

    #[test]
    fn test_generate_item_id_distinct_content() {
        assert_ne!(
            generate_item_id(&json!({"label": "Home"})),
            generate_item_id(&json!({"label": "Away"}))
        );
    }
}
