//! Transaction audit of a candidate chain
//!
//! Structural validation says nothing about the transactions a chain carries.
//! The audit checks each block beyond genesis for at most one correctly sized
//! reward, properly signed transfers whose declared input matches the sender's
//! balance, and no transaction appearing twice.
//!
//! Balances are computed against the chain the caller already trusts, not
//! against the candidate being audited.

use crate::core::balance::balance_of;
use crate::core::block::Block;
use crate::core::transaction::{valid_transaction, MINING_REWARD};
use std::collections::HashSet;
use thiserror::Error;

/// Why a chain failed the transaction audit
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("Block {block} carries more than one mining reward")]
    MultipleRewards { block: usize },
    #[error("Block {block} carries an invalid mining reward of {amount:?}")]
    InvalidRewardAmount { block: usize, amount: Option<u64> },
    #[error("Block {block} carries invalid transaction {id}")]
    InvalidTransaction { block: usize, id: String },
    #[error("Transaction {id} in block {block} declares input {declared}, balance is {expected}")]
    BalanceMismatch {
        block: usize,
        id: String,
        declared: u64,
        expected: u64,
    },
    #[error("Transaction {id} appears more than once in block {block}")]
    DuplicateTransaction { block: usize, id: String },
}

/// Audit every block of `chain` beyond genesis
pub fn audit_transactions(chain: &[Block], balance_source: &[Block]) -> Result<(), AuditError> {
    for (index, block) in chain.iter().enumerate().skip(1) {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut rewards = 0usize;

        for tx in block.transactions() {
            if tx.is_reward() {
                rewards += 1;
                if rewards > 1 {
                    return Err(AuditError::MultipleRewards { block: index });
                }

                let mut outputs = tx.output_map.values();
                let amount = outputs.next().copied();
                if amount != Some(MINING_REWARD) || outputs.next().is_some() {
                    return Err(AuditError::InvalidRewardAmount {
                        block: index,
                        amount,
                    });
                }
                continue;
            }

            if !valid_transaction(tx) {
                return Err(AuditError::InvalidTransaction {
                    block: index,
                    id: tx.id.clone(),
                });
            }

            let expected = balance_of(balance_source, &tx.input.address);
            if tx.input.amount != expected {
                return Err(AuditError::BalanceMismatch {
                    block: index,
                    id: tx.id.clone(),
                    declared: tx.input.amount,
                    expected,
                });
            }

            if !seen.insert(tx.id.as_str()) {
                return Err(AuditError::DuplicateTransaction {
                    block: index,
                    id: tx.id.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Boolean form of [`audit_transactions`]
pub fn is_valid_transaction_data(chain: &[Block], balance_source: &[Block]) -> bool {
    match audit_transactions(chain, balance_source) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("Chain failed transaction audit: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{mine_block, Payload};
    use crate::core::transaction::{reward_input, OutputMap, Transaction};
    use crate::wallet::Wallet;

    fn chain_with(txs: Vec<Transaction>) -> Vec<Block> {
        let genesis = Block::genesis();
        let block = mine_block(&genesis, Payload::Transactions(txs));
        vec![genesis, block]
    }

    fn local() -> Vec<Block> {
        vec![Block::genesis()]
    }

    #[test]
    fn test_valid_block_passes() {
        let wallet = Wallet::new();
        let chain = chain_with(vec![
            Transaction::transfer(&wallet, "bob", 10).unwrap(),
            Transaction::reward("miner"),
        ]);
        assert_eq!(audit_transactions(&chain, &local()), Ok(()));
        assert!(is_valid_transaction_data(&chain, &local()));
    }

    #[test]
    fn test_genesis_only_passes() {
        assert!(is_valid_transaction_data(&local(), &local()));
    }

    #[test]
    fn test_multiple_rewards() {
        let chain = chain_with(vec![Transaction::reward("a"), Transaction::reward("b")]);
        assert_eq!(
            audit_transactions(&chain, &local()),
            Err(AuditError::MultipleRewards { block: 1 })
        );
    }

    #[test]
    fn test_inflated_reward() {
        let mut reward = Transaction::reward("miner");
        reward.output_map.insert("miner".to_string(), MINING_REWARD * 10);
        let chain = chain_with(vec![reward]);
        assert_eq!(
            audit_transactions(&chain, &local()),
            Err(AuditError::InvalidRewardAmount {
                block: 1,
                amount: Some(MINING_REWARD * 10),
            })
        );
    }

    #[test]
    fn test_reward_with_extra_output() {
        let mut output_map = OutputMap::new();
        output_map.insert("a".to_string(), MINING_REWARD);
        output_map.insert("b".to_string(), MINING_REWARD);
        let chain = chain_with(vec![Transaction::from_parts(output_map, reward_input())]);
        assert!(matches!(
            audit_transactions(&chain, &local()),
            Err(AuditError::InvalidRewardAmount { block: 1, .. })
        ));
    }

    #[test]
    fn test_tampered_transfer() {
        let wallet = Wallet::new();
        let mut tx = Transaction::transfer(&wallet, "bob", 10).unwrap();
        tx.output_map.insert("bob".to_string(), 500);
        let id = tx.id.clone();
        let chain = chain_with(vec![tx]);
        assert_eq!(
            audit_transactions(&chain, &local()),
            Err(AuditError::InvalidTransaction { block: 1, id })
        );
    }

    #[test]
    fn test_declared_input_must_match_trusted_balance() {
        // A correctly signed transaction that claims a fabricated balance
        let wallet = Wallet::new();
        let mut output_map = OutputMap::new();
        output_map.insert("bob".to_string(), 100);
        output_map.insert(wallet.address().to_string(), 8900);
        let input = crate::core::transaction::TransactionInput {
            timestamp: 1,
            amount: 9000,
            address: wallet.address().to_string(),
            signature: wallet.sign(&output_map),
        };
        let tx = Transaction::from_parts(output_map, input);
        let id = tx.id.clone();

        let chain = chain_with(vec![tx]);
        assert_eq!(
            audit_transactions(&chain, &local()),
            Err(AuditError::BalanceMismatch {
                block: 1,
                id,
                declared: 9000,
                expected: crate::core::balance::STARTING_BALANCE,
            })
        );
    }

    #[test]
    fn test_duplicate_transaction() {
        let wallet = Wallet::new();
        let tx = Transaction::transfer(&wallet, "bob", 10).unwrap();
        let id = tx.id.clone();
        let chain = chain_with(vec![tx.clone(), tx]);
        assert_eq!(
            audit_transactions(&chain, &local()),
            Err(AuditError::DuplicateTransaction { block: 1, id })
        );
    }
}
