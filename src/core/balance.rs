//! Balance accounting derived from chain history
//!
//! Every spend re-issues the sender's remaining funds as a change output in
//! the same block, so the walk from the tip can stop at the most recent block
//! in which the address spent. Older history is already folded into that
//! change output.

use crate::core::block::Block;

/// Balance every address starts with before its first spend
pub const STARTING_BALANCE: u64 = 1000;

/// Spendable balance of `address` according to `chain`
pub fn balance_of(chain: &[Block], address: &str) -> u64 {
    let mut total = 0u64;
    let mut has_spent = false;

    // Genesis carries no transactions
    for block in chain.iter().skip(1).rev() {
        for tx in block.transactions() {
            if tx.input.address == address {
                has_spent = true;
            }
            if let Some(amount) = tx.output_map.get(address) {
                total = total.saturating_add(*amount);
            }
        }

        if has_spent {
            break;
        }
    }

    if has_spent {
        total
    } else {
        STARTING_BALANCE.saturating_add(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::block::{mine_block, Payload};
    use crate::core::transaction::{Transaction, MINING_REWARD};
    use crate::wallet::Wallet;

    fn append(chain: &mut Vec<Block>, txs: Vec<Transaction>) {
        let block = mine_block(chain.last().unwrap(), Payload::Transactions(txs));
        chain.push(block);
    }

    #[test]
    fn test_untouched_address_has_starting_balance() {
        let mut chain = vec![Block::genesis()];
        assert_eq!(balance_of(&chain, "nobody"), STARTING_BALANCE);

        append(&mut chain, vec![Transaction::reward("miner")]);
        assert_eq!(balance_of(&chain, "nobody"), STARTING_BALANCE);
    }

    #[test]
    fn test_received_outputs_are_added() {
        let mut chain = vec![Block::genesis()];
        let sender = Wallet::new();

        append(&mut chain, vec![Transaction::transfer(&sender, "bob", 50).unwrap()]);
        append(&mut chain, vec![Transaction::reward("bob")]);

        assert_eq!(balance_of(&chain, "bob"), STARTING_BALANCE + 50 + MINING_REWARD);
    }

    #[test]
    fn test_spend_resets_to_change_output() {
        let mut chain = vec![Block::genesis()];
        let mut sender = Wallet::new();

        append(&mut chain, vec![Transaction::transfer(&sender, "bob", 50).unwrap()]);
        assert_eq!(balance_of(&chain, sender.address()), STARTING_BALANCE - 50);

        sender.refresh_balance(&chain);
        append(&mut chain, vec![Transaction::transfer(&sender, "carol", 100).unwrap()]);
        assert_eq!(balance_of(&chain, sender.address()), STARTING_BALANCE - 150);
    }

    #[test]
    fn test_outputs_after_last_spend_count() {
        let mut chain = vec![Block::genesis()];
        let sender = Wallet::new();
        let other = Wallet::new();

        append(&mut chain, vec![Transaction::transfer(&sender, "bob", 50).unwrap()]);
        append(
            &mut chain,
            vec![Transaction::transfer(&other, sender.address(), 20).unwrap()],
        );

        assert_eq!(balance_of(&chain, sender.address()), STARTING_BALANCE - 50 + 20);
    }

    #[test]
    fn test_outputs_in_spend_block_count() {
        let mut chain = vec![Block::genesis()];
        let sender = Wallet::new();

        append(
            &mut chain,
            vec![
                Transaction::transfer(&sender, "bob", 50).unwrap(),
                Transaction::reward(sender.address()),
            ],
        );

        assert_eq!(
            balance_of(&chain, sender.address()),
            STARTING_BALANCE - 50 + MINING_REWARD
        );
    }
}
