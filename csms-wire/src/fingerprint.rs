//! Structural fingerprints
//!
//! A fingerprint is a 64-bit structural digest of a message, frozen when its
//! envelope is built. The engine uses it for deduplication and
//! idempotent-retry detection: a retried request gets a fresh correlation id
//! but keeps the fingerprint of the original.
//!
//! Scalar fields fold in with a fixed odd multiplier; JSON arrays fold in
//! order-independently (XOR), so two messages that differ only in collection
//! order compare equal. Deterministic within and across processes.

use serde_json::Value;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Fixed odd multiplier separating field positions
const FIELD_MULT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Tags keeping values of different JSON kinds from colliding
const TAG_NULL: u64 = 0x4d;
const TAG_BOOL: u64 = 0x61;
const TAG_NUMBER: u64 = 0x6f;
const TAG_STRING: u64 = 0x7b;
const TAG_ARRAY: u64 = 0x89;
const TAG_OBJECT: u64 = 0x97;

/// FNV-1a over raw bytes
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut h = FNV_OFFSET;
    for b in bytes {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// FNV-1a over a string
pub fn hash_str(s: &str) -> u64 {
    hash_bytes(s.as_bytes())
}

/// Fold one field digest into an accumulator, position-sensitively
pub fn combine(acc: u64, field: u64) -> u64 {
    acc.wrapping_mul(FIELD_MULT) ^ field
}

/// Structural digest of a JSON value.
///
/// Objects hash by sorted key (the underlying map is ordered), arrays hash
/// as unordered collections.
pub fn of_json(value: &Value) -> u64 {
    match value {
        Value::Null => TAG_NULL,
        Value::Bool(b) => combine(TAG_BOOL, u64::from(*b)),
        Value::Number(n) => combine(TAG_NUMBER, hash_str(&n.to_string())),
        Value::String(s) => combine(TAG_STRING, hash_str(s)),
        Value::Array(items) => {
            let folded = items.iter().map(of_json).fold(0u64, |acc, h| acc ^ h);
            combine(TAG_ARRAY, folded)
        }
        Value::Object(map) => {
            let mut acc = TAG_OBJECT;
            for (key, val) in map {
                acc = combine(acc, hash_str(key));
                acc = combine(acc, of_json(val));
            }
            acc
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deterministic() {
        let v = json!({"status": "Accepted", "evseIds": [1, 2, 3]});
        assert_eq!(of_json(&v), of_json(&v));
    }

    #[test]
    fn test_array_order_independent() {
        assert_eq!(
            of_json(&json!({"evseIds": [1, 2, 3]})),
            of_json(&json!({"evseIds": [3, 1, 2]}))
        );
    }

    #[test]
    fn test_object_key_order_irrelevant() {
        // serde_json orders object keys, so construction order cannot leak in
        let a = json!({"a": 1, "b": 2});
        let b = json!({"b": 2, "a": 1});
        assert_eq!(of_json(&a), of_json(&b));
    }

    #[test]
    fn test_structurally_similar_values_differ() {
        assert_ne!(of_json(&json!("1")), of_json(&json!(1)));
        assert_ne!(of_json(&json!(null)), of_json(&json!(0)));
        assert_ne!(of_json(&json!({"a": [1]})), of_json(&json!({"a": 1})));
        assert_ne!(
            of_json(&json!({"status": "Accepted"})),
            of_json(&json!({"status": "Rejected"}))
        );
    }

    #[test]
    fn test_combine_position_sensitive() {
        let a = combine(combine(0, hash_str("x")), hash_str("y"));
        let b = combine(combine(0, hash_str("y")), hash_str("x"));
        assert_ne!(a, b);
    }
}
