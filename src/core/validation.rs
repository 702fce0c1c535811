//! Structural chain validation
//!
//! Rules, checked in order and stopping at the first violation:
//! 1. the first block is exactly the genesis block
//! 2. every block's `last_hash` is the previous block's `hash`
//! 3. every block's `hash` is the canonical hash of its fields
//! 4. difficulty moves by at most one step between neighbours

use crate::core::block::Block;
use thiserror::Error;

/// Why a chain failed structural validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainValidationError {
    #[error("Chain is empty")]
    EmptyChain,
    #[error("First block is not the genesis block")]
    GenesisMismatch,
    #[error("Block {index} does not link to its predecessor")]
    BrokenLink { index: usize },
    #[error("Block {index} hash does not match its contents")]
    HashMismatch { index: usize },
    #[error("Block {index} difficulty jumped from {previous} to {current}")]
    DifficultyJump {
        index: usize,
        previous: u32,
        current: u32,
    },
}

/// Check rules 2-4 for `block` sitting at `index` right after `previous`
pub fn validate_link(
    previous: &Block,
    block: &Block,
    index: usize,
) -> Result<(), ChainValidationError> {
    if block.last_hash != previous.hash {
        return Err(ChainValidationError::BrokenLink { index });
    }

    if !block.verify_hash() {
        return Err(ChainValidationError::HashMismatch { index });
    }

    if previous.difficulty.abs_diff(block.difficulty) > 1 {
        return Err(ChainValidationError::DifficultyJump {
            index,
            previous: previous.difficulty,
            current: block.difficulty,
        });
    }

    Ok(())
}

/// Validate a whole chain, reporting the first rule it breaks
pub fn validate_chain(chain: &[Block]) -> Result<(), ChainValidationError> {
    let first = chain.first().ok_or(ChainValidationError::EmptyChain)?;
    if !first.is_genesis() {
        return Err(ChainValidationError::GenesisMismatch);
    }

    for (index, pair) in chain.windows(2).enumerate() {
        validate_link(&pair[0], &pair[1], index + 1)?;
    }

    Ok(())
}

/// Boolean form of [`validate_chain`]
pub fn is_valid_chain(chain: &[Block]) -> bool {
    match validate_chain(chain) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Chain failed validation: {}", e);
            false
        }
    }
}
