//! Mining module for block creation and transaction pooling

pub mod miner;
pub mod pool;

pub use miner::Miner;
pub use pool::TransactionPool;
