//! Blockchain implementation
//!
//! The chain container: genesis first, append-only in normal operation, and
//! replaced only as a whole by a longer valid candidate (longest chain wins).

use crate::core::audit::{audit_transactions, AuditError};
use crate::core::balance::balance_of;
use crate::core::block::{mine_block, Block, Payload};
use crate::core::validation::{validate_chain, validate_link, ChainValidationError};
use serde::Serialize;
use thiserror::Error;

/// Errors appending a block mined elsewhere
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Block was mined on a stale tip")]
    StaleTip,
    #[error("Invalid block: {0}")]
    InvalidBlock(ChainValidationError),
}

/// Why a candidate chain was not adopted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplaceError {
    #[error("Candidate chain of {candidate} blocks is not longer than local chain of {local}")]
    NotLonger { local: usize, candidate: usize },
    #[error("Candidate chain is invalid: {0}")]
    Structural(#[from] ChainValidationError),
    #[error("Candidate chain has invalid transaction data: {0}")]
    Audit(#[from] AuditError),
}

/// The ledger's chain of blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    /// Create a new chain holding only the genesis block
    pub fn new() -> Self {
        Self {
            blocks: vec![Block::genesis()],
        }
    }

    /// All blocks, genesis first
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Get the latest block
    pub fn latest_block(&self) -> &Block {
        // The chain is never empty: it starts at genesis and is only
        // replaced by candidates that passed validation.
        &self.blocks[self.blocks.len() - 1]
    }

    /// Number of blocks including genesis
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Never true once constructed
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Mine `data` on top of the tip and append it
    pub fn add_block(&mut self, data: Payload) -> &Block {
        let block = mine_block(self.latest_block(), data);
        log::info!(
            "Mined block {} at difficulty {} (nonce {})",
            block.hash,
            block.difficulty,
            block.nonce
        );
        self.blocks.push(block);
        self.latest_block()
    }

    /// Append a block that was mined away from the chain
    ///
    /// The block must build on the current tip and pass the same per-block
    /// rules as full chain validation.
    pub fn push_block(&mut self, block: Block) -> Result<(), BlockchainError> {
        let tip = self.latest_block();
        if block.last_hash != tip.hash {
            return Err(BlockchainError::StaleTip);
        }

        validate_link(tip, &block, self.blocks.len()).map_err(BlockchainError::InvalidBlock)?;
        self.blocks.push(block);
        Ok(())
    }

    /// Adopt `candidate` if it is longer and valid
    pub fn replace_chain(
        &mut self,
        candidate: Vec<Block>,
        audit_transactions: bool,
    ) -> Result<(), ReplaceError> {
        self.replace_chain_with(candidate, audit_transactions, |_| {})
    }

    /// Adopt `candidate` if it is longer and valid, running `on_accept` first
    ///
    /// The hook sees the accepted chain before it replaces the local one. On
    /// rejection the local chain is left untouched and the failing stage is
    /// returned.
    pub fn replace_chain_with<F>(
        &mut self,
        candidate: Vec<Block>,
        audit: bool,
        on_accept: F,
    ) -> Result<(), ReplaceError>
    where
        F: FnOnce(&[Block]),
    {
        let result = self.check_candidate(&candidate, audit);
        if let Err(e) = &result {
            log::warn!("Rejected candidate chain: {}", e);
            return result;
        }

        on_accept(&candidate);
        log::info!(
            "Replacing chain of {} blocks with chain of {} blocks",
            self.blocks.len(),
            candidate.len()
        );
        self.blocks = candidate;
        Ok(())
    }

    fn check_candidate(&self, candidate: &[Block], audit: bool) -> Result<(), ReplaceError> {
        if candidate.len() <= self.blocks.len() {
            return Err(ReplaceError::NotLonger {
                local: self.blocks.len(),
                candidate: candidate.len(),
            });
        }

        validate_chain(candidate)?;

        if audit {
            audit_transactions(candidate, &self.blocks)?;
        }

        Ok(())
    }

    /// Balance of `address` according to this chain
    pub fn balance_of(&self, address: &str) -> u64 {
        balance_of(&self.blocks, address)
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::Transaction;
    use crate::wallet::Wallet;

    fn opaque(bytes: &[u8]) -> Payload {
        Payload::Opaque(bytes.to_vec())
    }

    #[test]
    fn test_new_blockchain() {
        let blockchain = Blockchain::new();
        assert_eq!(blockchain.len(), 1);
        assert!(blockchain.latest_block().is_genesis());
    }

    #[test]
    fn test_add_block() {
        let mut blockchain = Blockchain::new();
        let tip = blockchain.add_block(opaque(b"foo")).clone();

        assert_eq!(blockchain.len(), 2);
        assert_eq!(tip.last_hash, Block::genesis().hash);
        assert_eq!(tip.data, opaque(b"foo"));
        assert!(validate_chain(blockchain.blocks()).is_ok());
    }

    #[test]
    fn test_push_block() {
        let mut blockchain = Blockchain::new();
        let block = mine_block(blockchain.latest_block(), opaque(b"detached"));

        blockchain.push_block(block.clone()).unwrap();
        assert_eq!(blockchain.latest_block(), &block);

        // Same block again no longer links to the tip
        assert_eq!(blockchain.push_block(block), Err(BlockchainError::StaleTip));
    }

    #[test]
    fn test_push_tampered_block() {
        let mut blockchain = Blockchain::new();
        let mut block = mine_block(blockchain.latest_block(), opaque(b"detached"));
        block.data = opaque(b"swapped");

        assert_eq!(
            blockchain.push_block(block),
            Err(BlockchainError::InvalidBlock(ChainValidationError::HashMismatch { index: 1 }))
        );
        assert_eq!(blockchain.len(), 1);
    }

    #[test]
    fn test_replace_with_shorter_or_equal() {
        let mut local = Blockchain::new();
        local.add_block(opaque(b"a"));
        let before = local.clone();

        let mut other = Blockchain::new();
        other.add_block(opaque(b"b"));

        assert_eq!(
            local.replace_chain(other.blocks().to_vec(), false),
            Err(ReplaceError::NotLonger {
                local: 2,
                candidate: 2
            })
        );
        assert_eq!(local, before);
    }

    #[test]
    fn test_replace_with_invalid_longer_chain() {
        let mut local = Blockchain::new();
        let mut other = Blockchain::new();
        other.add_block(opaque(b"a"));
        other.add_block(opaque(b"b"));

        let mut candidate = other.blocks().to_vec();
        candidate[1].last_hash = "some-fake-hash".to_string();

        let mut called = false;
        let result = local.replace_chain_with(candidate, false, |_| called = true);

        assert!(matches!(result, Err(ReplaceError::Structural(_))));
        assert!(!called);
        assert_eq!(local, Blockchain::new());
    }

    #[test]
    fn test_replace_with_valid_longer_chain() {
        let mut local = Blockchain::new();
        let mut other = Blockchain::new();
        other.add_block(opaque(b"a"));
        other.add_block(opaque(b"b"));

        let mut seen_len = 0;
        local
            .replace_chain_with(other.blocks().to_vec(), true, |chain| seen_len = chain.len())
            .unwrap();

        assert_eq!(seen_len, 3);
        assert_eq!(local, other);
    }

    #[test]
    fn test_replace_runs_audit_when_asked() {
        let mut local = Blockchain::new();
        let mut other = Blockchain::new();
        other.add_block(Payload::Transactions(vec![
            Transaction::reward("a"),
            Transaction::reward("b"),
        ]));

        let candidate = other.blocks().to_vec();
        assert!(matches!(
            local.replace_chain(candidate.clone(), true),
            Err(ReplaceError::Audit(AuditError::MultipleRewards { block: 1 }))
        ));
        assert_eq!(local.len(), 1);

        // Without the audit flag the structurally valid chain is adopted
        local.replace_chain(candidate, false).unwrap();
        assert_eq!(local, other);
    }

    #[test]
    fn test_mine_after_adopting_chain_with_minimal_timestamp() {
        let genesis = Block::genesis();
        let data = Payload::Transactions(vec![]);
        let hash = hex::encode(Block::digest(
            i64::MIN,
            &genesis.hash,
            &data,
            genesis.difficulty,
            0,
        ));
        let candidate = vec![
            genesis.clone(),
            Block {
                timestamp: i64::MIN,
                last_hash: genesis.hash.clone(),
                hash,
                nonce: 0,
                difficulty: genesis.difficulty,
                data,
            },
        ];

        let mut local = Blockchain::new();
        local.replace_chain(candidate, true).unwrap();

        local.add_block(opaque(b"next"));
        assert_eq!(local.len(), 3);
        assert!(validate_chain(local.blocks()).is_ok());
    }

    #[test]
    fn test_balance_of() {
        let mut blockchain = Blockchain::new();
        let wallet = Wallet::new();
        let tx = Transaction::transfer(&wallet, "bob", 50).unwrap();
        blockchain.add_block(Payload::Transactions(vec![tx]));

        assert_eq!(blockchain.balance_of("bob"), 1050);
        assert_eq!(blockchain.balance_of(wallet.address()), 950);
    }

    #[test]
    fn test_serializes_as_block_array() {
        let mut blockchain = Blockchain::new();
        blockchain.add_block(opaque(b"x"));

        let json = serde_json::to_value(&blockchain).unwrap();
        assert!(json.is_array());

        let decoded: Vec<Block> = serde_json::from_value(json).unwrap();
        assert!(validate_chain(&decoded).is_ok());
    }
}
