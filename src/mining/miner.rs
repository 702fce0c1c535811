//! Mining engine for the ledger
//!
//! Turns the valid part of the transaction pool plus a reward for the miner
//! into the next block.

use crate::core::{mine_block, Block, Blockchain, Payload, Transaction};
use crate::mining::TransactionPool;
use log::info;
use std::time::Instant;

/// Miner for creating new blocks
pub struct Miner {
    /// Miner's address for receiving rewards
    pub address: String,
}

impl Miner {
    /// Create a new miner
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }

    /// Block payload: the given transactions followed by this miner's reward
    pub fn payload(&self, mut transactions: Vec<Transaction>) -> Payload {
        transactions.push(Transaction::reward(&self.address));
        Payload::Transactions(transactions)
    }

    /// Mine the pool's valid transactions into the chain
    ///
    /// Committed transactions are purged from the pool afterwards.
    pub fn mine_transactions(
        &self,
        blockchain: &mut Blockchain,
        pool: &mut TransactionPool,
    ) -> Block {
        let transactions = pool.valid_transactions();
        let count = transactions.len();
        let start = Instant::now();

        let block = blockchain.add_block(self.payload(transactions)).clone();
        info!(
            "Mined {} pooled transactions in {}ms",
            count,
            start.elapsed().as_millis()
        );

        pool.clear_blockchain_transactions(blockchain.blocks());
        block
    }

    /// Mine a block without touching shared state
    ///
    /// The caller pushes the result onto the chain; it is rejected there if
    /// the tip moved in the meantime.
    pub fn mine_detached(&self, last_block: &Block, transactions: Vec<Transaction>) -> Block {
        let start = Instant::now();
        let block = mine_block(last_block, self.payload(transactions));

        info!(
            "Block {} mined in {}ms (nonce {}, difficulty {})",
            block.hash,
            start.elapsed().as_millis(),
            block.nonce,
            block.difficulty
        );
        block
    }
}
