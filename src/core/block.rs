//! Block implementation for the ledger
//!
//! A block links to its predecessor by hash and carries a payload. Blocks
//! are produced by proof-of-work mining (apart from the fixed genesis block)
//! and never change afterwards.

use crate::core::transaction::Transaction;
use crate::crypto::{canonical_digest, hex_meets_difficulty, meets_difficulty};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

// =============================================================================
// Block Constants
// =============================================================================

/// Target interval between blocks in milliseconds
pub const MINE_RATE: i64 = 1000;

/// Difficulty of the genesis block
pub const INITIAL_DIFFICULTY: u32 = 3;

/// Last-hash placeholder stored in the genesis block
pub const GENESIS_LAST_HASH: &str = "------";

/// Hash stored in the genesis block
pub const GENESIS_HASH: &str = "1";

/// Current time in Unix milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Block payload
///
/// Mined blocks carry transactions. Opaque bytes cover the genesis block and
/// free-form data. Both serialize as a plain JSON array, and an empty array
/// reads back as an empty transaction list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    Transactions(Vec<Transaction>),
    Opaque(Vec<u8>),
}

impl Payload {
    /// Transactions carried by the payload (empty for opaque data)
    pub fn transactions(&self) -> &[Transaction] {
        match self {
            Payload::Transactions(txs) => txs,
            Payload::Opaque(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Transactions(txs) => txs.is_empty(),
            Payload::Opaque(bytes) => bytes.is_empty(),
        }
    }
}

impl From<Vec<Transaction>> for Payload {
    fn from(txs: Vec<Transaction>) -> Self {
        Payload::Transactions(txs)
    }
}

/// A block in the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Creation time in Unix milliseconds
    pub timestamp: i64,
    /// Hash of the previous block
    pub last_hash: String,
    /// Canonical hash of this block's other fields
    pub hash: String,
    /// Nonce found by proof of work
    pub nonce: u64,
    /// Number of leading zero bits the hash had to have
    pub difficulty: u32,
    /// Block payload
    pub data: Payload,
}

impl Block {
    /// The fixed genesis block shared by every participant
    pub fn genesis() -> Self {
        Self {
            timestamp: 1,
            last_hash: GENESIS_LAST_HASH.to_string(),
            hash: GENESIS_HASH.to_string(),
            nonce: 0,
            difficulty: INITIAL_DIFFICULTY,
            data: Payload::Opaque(Vec::new()),
        }
    }

    /// Whether this block is field-for-field the genesis block
    ///
    /// Compared on the serialized form, so an empty payload matches in either
    /// of its representations.
    pub fn is_genesis(&self) -> bool {
        match (serde_json::to_value(self), serde_json::to_value(Self::genesis())) {
            (Ok(ours), Ok(genesis)) => ours == genesis,
            _ => false,
        }
    }

    /// Canonical digest over the hashed block fields
    pub fn digest(
        timestamp: i64,
        last_hash: &str,
        data: &Payload,
        difficulty: u32,
        nonce: u64,
    ) -> [u8; 32] {
        canonical_digest(&[
            json!(timestamp),
            json!(last_hash),
            json!(data),
            json!(difficulty),
            json!(nonce),
        ])
    }

    /// Recompute the hash from this block's fields
    pub fn calculate_hash(&self) -> String {
        hex::encode(Self::digest(
            self.timestamp,
            &self.last_hash,
            &self.data,
            self.difficulty,
            self.nonce,
        ))
    }

    /// Verify the stored block hash
    pub fn verify_hash(&self) -> bool {
        self.hash == self.calculate_hash()
    }

    /// Check if the proof of work is valid
    pub fn is_valid_pow(&self) -> bool {
        hex_meets_difficulty(&self.hash, self.difficulty)
    }

    /// Transactions carried by this block
    pub fn transactions(&self) -> &[Transaction] {
        self.data.transactions()
    }
}

// =============================================================================
// Difficulty Retarget
// =============================================================================

/// Difficulty for a block following `original` mined at `timestamp`
///
/// One step easier when the gap exceeds [`MINE_RATE`], one step harder
/// otherwise, never below 1.
pub fn adjust_difficulty(original: &Block, timestamp: i64) -> u32 {
    let difficulty = original.difficulty;
    if difficulty < 1 {
        return 1;
    }

    // Peer-supplied timestamps are unbounded
    if timestamp.saturating_sub(original.timestamp) > MINE_RATE {
        (difficulty - 1).max(1)
    } else {
        difficulty.saturating_add(1)
    }
}

// =============================================================================
// Proof of Work
// =============================================================================

/// Mine a block on top of `last_block`
///
/// Blocks the caller until a qualifying hash is found.
pub fn mine_block(last_block: &Block, data: Payload) -> Block {
    mine_block_with_clock(last_block, data, now_millis)
}

/// Mine a block reading time from `clock`
///
/// Time is sampled and the difficulty recomputed on every attempt, so the
/// target can move while the search runs.
pub fn mine_block_with_clock<F>(last_block: &Block, data: Payload, mut clock: F) -> Block
where
    F: FnMut() -> i64,
{
    let last_hash = last_block.hash.clone();
    let mut nonce = 0u64;

    loop {
        nonce += 1;
        let timestamp = clock();
        let difficulty = adjust_difficulty(last_block, timestamp);
        let digest = Block::digest(timestamp, &last_hash, &data, difficulty, nonce);

        if meets_difficulty(&digest, difficulty) {
            log::debug!(
                "Found nonce {} at difficulty {} on top of {}",
                nonce,
                difficulty,
                last_hash
            );
            return Block {
                timestamp,
                last_hash,
                hash: hex::encode(digest),
                nonce,
                difficulty,
                data,
            };
        }
    }
}
