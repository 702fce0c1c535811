//! Mini-Ledger: a proof-of-work ledger with account balances
//!
//! This crate provides:
//! - Blocks mined with a self-adjusting leading-zero-bit difficulty
//! - Structural chain validation and longest-valid-chain replacement
//! - Signed account transfers (secp256k1) with change outputs
//! - Balances derived from chain history
//! - A transaction pool and a miner that rewards itself per block
//! - A node applying peer messages to its chain and pool
//!
//! # Example
//!
//! ```rust
//! use mini_ledger::core::Blockchain;
//! use mini_ledger::mining::{Miner, TransactionPool};
//! use mini_ledger::wallet::Wallet;
//!
//! let mut blockchain = Blockchain::new();
//! let mut pool = TransactionPool::new();
//! let mut wallet = Wallet::new();
//!
//! let tx = wallet
//!     .create_transaction("recipient", 10, Some(blockchain.blocks()))
//!     .unwrap();
//! pool.set_transaction(tx);
//!
//! let miner = Miner::new(wallet.address());
//! let block = miner.mine_transactions(&mut blockchain, &mut pool);
//! println!("Mined block {} at difficulty {}", block.hash, block.difficulty);
//!
//! println!("Balance: {}", blockchain.balance_of(wallet.address()));
//! ```

pub mod core;
pub mod crypto;
pub mod mining;
pub mod network;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use core::{
    Block, Blockchain, Payload, Transaction, INITIAL_DIFFICULTY, MINE_RATE, MINING_REWARD,
    STARTING_BALANCE,
};
pub use crypto::KeyPair;
pub use mining::{Miner, TransactionPool};
pub use network::{Message, Node, NodeConfig};
pub use wallet::Wallet;
