//! Hashing utilities for the ledger
//!
//! The canonical hash is the fingerprint used for block hashes and signing
//! payloads. Each argument is serialized to JSON text, the texts are sorted
//! lexicographically and joined with a single space, and SHA-256 is taken over
//! the result. Sorting makes the digest independent of argument order, which
//! block verification relies on: blocks are hashed with their fields in a
//! different order at mining time than at validation time.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Separator placed between serialized arguments
const SEPARATOR: &str = " ";

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes the order-independent digest over a list of values
pub fn canonical_digest(parts: &[Value]) -> [u8; 32] {
    let mut serialized: Vec<String> = parts.iter().map(Value::to_string).collect();
    serialized.sort();
    sha256(serialized.join(SEPARATOR).as_bytes())
}

/// Computes the canonical hash as lowercase hex
pub fn canonical_hash(parts: &[Value]) -> String {
    hex::encode(canonical_digest(parts))
}

/// Checks if a hash meets the difficulty target
/// The hash must have `difficulty` leading zero bits
pub fn meets_difficulty(hash: &[u8], difficulty: u32) -> bool {
    let required_zeros = difficulty as usize / 8;
    let remaining_bits = difficulty as usize % 8;

    if required_zeros > hash.len() {
        return false;
    }

    // Check full zero bytes
    for byte in hash.iter().take(required_zeros) {
        if *byte != 0 {
            return false;
        }
    }

    // Check remaining bits
    if remaining_bits > 0 {
        if required_zeros >= hash.len() {
            return false;
        }
        let mask = 0xFFu8 << (8 - remaining_bits);
        if hash[required_zeros] & mask != 0 {
            return false;
        }
    }

    true
}

/// Same as [`meets_difficulty`] for a hex encoded hash
pub fn hex_meets_difficulty(hash_hex: &str, difficulty: u32) -> bool {
    match hex::decode(hash_hex) {
        Ok(bytes) => meets_difficulty(&bytes, difficulty),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_hash_known_value() {
        assert_eq!(
            canonical_hash(&[json!("foo")]),
            "b2213295d564916f89a6a42455567c87c3f480fcd7a1c15e220f17d7169a790b"
        );
    }

    #[test]
    fn test_canonical_hash_is_order_independent() {
        let forward = canonical_hash(&[json!("one"), json!("two"), json!("three")]);
        let shuffled = canonical_hash(&[json!("three"), json!("one"), json!("two")]);
        assert_eq!(forward, shuffled);

        let mixed = canonical_hash(&[json!(42), json!("abc"), json!([1, 2]), json!({"k": 7})]);
        let mixed_rev = canonical_hash(&[json!({"k": 7}), json!([1, 2]), json!("abc"), json!(42)]);
        assert_eq!(mixed, mixed_rev);
    }

    #[test]
    fn test_canonical_hash_changes_with_content() {
        let empty = canonical_hash(&[json!({})]);
        let filled = canonical_hash(&[json!({"a": "a"})]);
        assert_ne!(empty, filled);
        assert_eq!(empty.len(), 64);
    }

    #[test]
    fn test_meets_difficulty() {
        let hash = vec![0x00, 0x00, 0x0F, 0xFF, 0xFF, 0xFF];
        assert!(meets_difficulty(&hash, 16));
        assert!(meets_difficulty(&hash, 20));
        assert!(!meets_difficulty(&hash, 21));
        assert!(!meets_difficulty(&hash, 24));
        assert!(meets_difficulty(&hash, 0));
    }

    #[test]
    fn test_meets_difficulty_past_hash_length() {
        let hash = [0u8; 2];
        assert!(meets_difficulty(&hash, 16));
        assert!(!meets_difficulty(&hash, 17));
        assert!(!meets_difficulty(&hash, 64));
    }

    #[test]
    fn test_hex_meets_difficulty() {
        assert!(hex_meets_difficulty("0fff", 4));
        assert!(!hex_meets_difficulty("1fff", 4));
        assert!(!hex_meets_difficulty("not hex", 1));
    }
}
