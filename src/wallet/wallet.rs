//! Wallet implementation for the ledger
//!
//! A wallet holds a key pair and a cached balance. The cache is advisory:
//! the chain is the source of truth and the balance is refreshed from it
//! whenever a chain is at hand.

use crate::core::{balance_of, output_map_digest, Block, OutputMap, Transaction, TransactionError};
use crate::core::STARTING_BALANCE;
use crate::crypto::KeyPair;
use serde::{Deserialize, Serialize};

/// A ledger wallet for signing transfers
#[derive(Clone)]
pub struct Wallet {
    /// The key pair for signing transactions
    key_pair: KeyPair,
    /// Hex public key, doubling as the address
    address: String,
    /// Last known balance
    balance: u64,
}

impl Wallet {
    /// Create a new wallet with a fresh key pair
    pub fn new() -> Self {
        Self::from_key_pair(KeyPair::generate())
    }

    /// Wrap an existing key pair
    pub fn from_key_pair(key_pair: KeyPair) -> Self {
        let address = key_pair.public_key_hex();
        Self {
            key_pair,
            address,
            balance: STARTING_BALANCE,
        }
    }

    /// Get the wallet's address
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Cached balance
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Recompute the cached balance from `chain`
    pub fn refresh_balance(&mut self, chain: &[Block]) -> u64 {
        self.balance = balance_of(chain, &self.address);
        self.balance
    }

    /// Sign an output map, returning the hex DER signature
    pub fn sign(&self, output_map: &OutputMap) -> String {
        self.key_pair.sign(&output_map_digest(output_map))
    }

    /// Create a transfer of `amount` to `recipient`
    ///
    /// When `chain` is given the balance is refreshed from it first.
    pub fn create_transaction(
        &mut self,
        recipient: &str,
        amount: u64,
        chain: Option<&[Block]>,
    ) -> Result<Transaction, TransactionError> {
        if let Some(chain) = chain {
            self.refresh_balance(chain);
        }

        Transaction::transfer(self, recipient, amount)
    }

    /// Export wallet info (without private key)
    pub fn info(&self, chain: &[Block]) -> WalletInfo {
        WalletInfo {
            address: self.address.clone(),
            balance: balance_of(chain, &self.address),
        }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Public wallet information (safe to share)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub address: String,
    pub balance: u64,
}
