//! Transaction handling for the ledger
//!
//! A transaction moves value out of a single sender's balance into an output
//! map. The sender keeps the remainder as a change output, so the outputs
//! always add up to the declared input amount. The input carries a signature
//! over the output map made with the sender's key.
//!
//! Reward transactions are the exception: their input is the fixed
//! [`reward_input`] sentinel and they are never signed.

use crate::core::block::now_millis;
use crate::crypto::{canonical_digest, verify_signature};
use crate::wallet::Wallet;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// Constants
// =============================================================================

/// Amount credited to the miner of a block
pub const MINING_REWARD: u64 = 50;

/// Sentinel input address marking a reward transaction
pub const REWARD_ADDRESS: &str = "*authorized-reward*";

/// Recipient address -> amount, kept sorted so its serialized form is stable
pub type OutputMap = BTreeMap<String, u64>;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransactionError {
    #[error("Amount exceeds balance: requested {amount}, available {available}")]
    BalanceExceeded { amount: u64, available: u64 },
    #[error("Sender {0} cannot be the recipient of its own transfer")]
    SelfTransfer(String),
}

// =============================================================================
// Transaction Input
// =============================================================================

/// Transaction input describing the sender side of a transfer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TransactionInput {
    /// Creation (or last amendment) time in Unix milliseconds
    pub timestamp: i64,
    /// Sender balance the transfer spends from
    pub amount: u64,
    /// Sender address (hex public key)
    pub address: String,
    /// Hex DER signature over the output map
    pub signature: String,
}

/// The fixed input carried by every reward transaction
pub fn reward_input() -> TransactionInput {
    TransactionInput {
        timestamp: 0,
        amount: MINING_REWARD,
        address: REWARD_ADDRESS.to_string(),
        signature: String::new(),
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A signed value-transfer record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction ID
    pub id: String,
    /// Recipient address -> amount
    pub output_map: OutputMap,
    /// Sender-side data and signature
    pub input: TransactionInput,
}

impl Transaction {
    /// Create a signed transfer of `amount` from `sender` to `recipient`
    ///
    /// The sender's whole cached balance is spent: `recipient` receives
    /// `amount` and the sender gets the rest back as change.
    pub fn transfer(sender: &Wallet, recipient: &str, amount: u64) -> Result<Self, TransactionError> {
        // The change output would overwrite the transfer output
        if recipient == sender.address() {
            return Err(TransactionError::SelfTransfer(recipient.to_string()));
        }

        let balance = sender.balance();
        if amount > balance {
            return Err(TransactionError::BalanceExceeded {
                amount,
                available: balance,
            });
        }

        let mut output_map = OutputMap::new();
        output_map.insert(recipient.to_string(), amount);
        output_map.insert(sender.address().to_string(), balance - amount);

        let input = Self::create_input(sender, &output_map);
        Ok(Self::from_parts(output_map, input))
    }

    /// Rebuild a transaction from an explicit output map and input
    ///
    /// A fresh ID is assigned.
    pub fn from_parts(output_map: OutputMap, input: TransactionInput) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            output_map,
            input,
        }
    }

    /// Create the reward transaction for a block mined by `miner_address`
    pub fn reward(miner_address: &str) -> Self {
        let mut output_map = OutputMap::new();
        output_map.insert(miner_address.to_string(), MINING_REWARD);
        Self::from_parts(output_map, reward_input())
    }

    fn create_input(sender: &Wallet, output_map: &OutputMap) -> TransactionInput {
        TransactionInput {
            timestamp: now_millis(),
            amount: sender.balance(),
            address: sender.address().to_string(),
            signature: sender.sign(output_map),
        }
    }

    /// Add another transfer from the same sender and re-sign
    ///
    /// Fails if `amount` is more than the sender's remaining change output.
    pub fn update(
        &mut self,
        sender: &Wallet,
        recipient: &str,
        amount: u64,
    ) -> Result<(), TransactionError> {
        if recipient == sender.address() {
            return Err(TransactionError::SelfTransfer(recipient.to_string()));
        }

        let available = self
            .output_map
            .get(sender.address())
            .copied()
            .unwrap_or(0);

        if amount > available {
            return Err(TransactionError::BalanceExceeded { amount, available });
        }

        *self.output_map.entry(recipient.to_string()).or_insert(0) += amount;
        if let Some(change) = self.output_map.get_mut(sender.address()) {
            *change -= amount;
        }

        self.input = Self::create_input(sender, &self.output_map);
        Ok(())
    }

    /// Whether this is a reward transaction
    pub fn is_reward(&self) -> bool {
        self.input.address == REWARD_ADDRESS
    }

    /// Sum of all outputs, `None` on overflow
    pub fn total_output(&self) -> Option<u64> {
        self.output_map
            .values()
            .try_fold(0u64, |total, amount| total.checked_add(*amount))
    }
}

/// Digest of an output map, the payload that gets signed
pub fn output_map_digest(output_map: &OutputMap) -> [u8; 32] {
    canonical_digest(&[json!(output_map)])
}

/// Audit predicate for an ordinary transfer
///
/// Holds when the outputs add up to the input amount and the signature
/// verifies over the output map for the input address.
pub fn valid_transaction(tx: &Transaction) -> bool {
    let address = &tx.input.address;

    if tx.total_output() != Some(tx.input.amount) {
        log::warn!("Invalid transaction {} from {}: outputs do not match input", tx.id, address);
        return false;
    }

    let digest = output_map_digest(&tx.output_map);
    match verify_signature(address, &digest, &tx.input.signature) {
        Ok(true) => true,
        Ok(false) => {
            log::warn!("Invalid signature on transaction {} from {}", tx.id, address);
            false
        }
        Err(e) => {
            log::warn!("Unverifiable transaction {} from {}: {}", tx.id, address, e);
            false
        }
    }
}
