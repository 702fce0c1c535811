//! Transaction pool for pending transactions
//!
//! Holds transfers that have been submitted but not yet committed to a block.
//! Entries are keyed by transaction ID; an entry leaves the pool once a
//! block carrying its ID is on the chain.
//!
//! The pool does not limit senders to one pending transaction. Callers that
//! want a single pending transfer per sender look it up with
//! [`TransactionPool::find_by_sender`] and amend it.

use crate::core::{valid_transaction, Block, Transaction};
use std::collections::{HashMap, HashSet};

/// Pending transactions keyed by ID
#[derive(Debug, Default, Clone)]
pub struct TransactionPool {
    /// Transactions indexed by ID
    entries: HashMap<String, Transaction>,
    /// Transaction IDs in order of arrival
    by_time: Vec<String>,
}

impl TransactionPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a transaction, or overwrite the entry with the same ID
    pub fn set_transaction(&mut self, tx: Transaction) {
        if !self.entries.contains_key(&tx.id) {
            self.by_time.push(tx.id.clone());
        }
        self.entries.insert(tx.id.clone(), tx);
    }

    /// Replace the whole pool with `map`
    pub fn set_map(&mut self, map: HashMap<String, Transaction>) {
        let mut by_time: Vec<String> = map.keys().cloned().collect();
        by_time.sort_by_key(|id| map[id].input.timestamp);
        self.entries = map;
        self.by_time = by_time;
    }

    /// The earliest pending transaction sent from `address`
    pub fn find_by_sender(&self, address: &str) -> Option<&Transaction> {
        self.iter().find(|tx| tx.input.address == address)
    }

    /// Look up a transaction by ID
    pub fn get(&self, id: &str) -> Option<&Transaction> {
        self.entries.get(id)
    }

    /// Transactions in order of arrival
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.by_time.iter().filter_map(|id| self.entries.get(id))
    }

    /// The pool as an ID -> transaction map
    pub fn transactions(&self) -> &HashMap<String, Transaction> {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Valid pending transactions, in order of arrival
    ///
    /// Entries that fail validation are evicted and logged.
    pub fn valid_transactions(&mut self) -> Vec<Transaction> {
        let (valid, invalid): (Vec<&Transaction>, Vec<&Transaction>) =
            self.iter().partition(|tx| valid_transaction(tx));

        let valid: Vec<Transaction> = valid.into_iter().cloned().collect();
        let invalid: Vec<String> = invalid.into_iter().map(|tx| tx.id.clone()).collect();

        for id in &invalid {
            log::warn!("Discarding invalid pooled transaction {}", id);
        }
        self.remove_all(invalid.iter().map(String::as_str).collect());

        valid
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_time.clear();
    }

    /// Remove every entry committed in `chain` beyond genesis
    pub fn clear_blockchain_transactions(&mut self, chain: &[Block]) {
        let committed: HashSet<&str> = chain
            .iter()
            .skip(1)
            .flat_map(|block| block.transactions())
            .map(|tx| tx.id.as_str())
            .collect();

        let before = self.entries.len();
        self.remove_all(committed);

        let removed = before - self.entries.len();
        if removed > 0 {
            log::debug!("Purged {} committed transactions from the pool", removed);
        }
    }

    fn remove_all(&mut self, ids: HashSet<&str>) {
        if ids.is_empty() {
            return;
        }
        self.entries.retain(|id, _| !ids.contains(id.as_str()));
        self.by_time.retain(|id| !ids.contains(id.as_str()));
    }
}
