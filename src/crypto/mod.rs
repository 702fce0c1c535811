//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 and the order-independent canonical hash
//! - Leading-zero-bit difficulty checks
//! - ECDSA key management (secp256k1)

pub mod hash;
pub mod keys;

pub use hash::{canonical_digest, canonical_hash, hex_meets_difficulty, meets_difficulty, sha256};
pub use keys::{public_key_from_hex, verify_signature, KeyError, KeyPair};
