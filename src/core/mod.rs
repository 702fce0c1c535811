//! Core ledger components
//!
//! This module contains the consensus engine:
//! - Blocks, proof-of-work mining and difficulty retarget
//! - Signed transactions and the reward variant
//! - Structural chain validation
//! - Balance accounting and transaction audit
//! - The chain container and its longest-chain replacement rule

pub mod audit;
pub mod balance;
pub mod block;
pub mod blockchain;
pub mod transaction;
pub mod validation;

pub use audit::{audit_transactions, is_valid_transaction_data, AuditError};
pub use balance::{balance_of, STARTING_BALANCE};
pub use block::{
    adjust_difficulty, mine_block, mine_block_with_clock, now_millis, Block, Payload,
    INITIAL_DIFFICULTY, MINE_RATE,
};
pub use blockchain::{Blockchain, BlockchainError, ReplaceError};
pub use transaction::{
    output_map_digest, reward_input, valid_transaction, OutputMap, Transaction, TransactionError,
    TransactionInput, MINING_REWARD, REWARD_ADDRESS,
};
pub use validation::{is_valid_chain, validate_chain, validate_link, ChainValidationError};
