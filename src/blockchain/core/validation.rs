use crate::blockchain::core::chain::{Block, BLOCK_REWARD};
use crate::error::ChainError;
use crate::transaction::validate_structure;
use std::collections::HashSet;

/// Per-block transaction rules, checked before any chain mutation:
/// structural validity of every transaction, hash uniqueness both within
/// the block and against already confirmed transactions, confirmation
/// metadata pointing at this block, and the coinbase discipline (first
/// position, crediting the block's miner, fee-free, worth at most the
/// block reward plus the block's fees). Later positions may also carry
/// sentinel-funded transactions submitted through the pool; those mint
/// value for their recipient and are fee-free by construction.
pub fn validate_block_transactions(
    block: &Block,
    confirmed: &HashSet<String>,
) -> Result<(), ChainError> {
    // Genesis is the fixed empty block; nothing to check.
    if block.index == 0 {
        return Ok(());
    }

    if block.transactions.is_empty() {
        return Err(ChainError::InvalidTransaction(
            "non-genesis blocks must carry a coinbase transaction".to_string(),
        ));
    }

    let mut seen = HashSet::new();

    for (i, tx) in block.transactions.iter().enumerate() {
        validate_structure(tx)?;

        if i == 0 && !tx.is_coinbase() {
            return Err(ChainError::InvalidTransaction(
                "first transaction of a block must be the reward coinbase".to_string(),
            ));
        }

        if tx.mined_in_block_index != Some(block.index) {
            return Err(ChainError::InvalidTransaction(format!(
                "transaction {} does not reference containing block {}",
                tx.transaction_data_hash, block.index
            )));
        }

        if !seen.insert(tx.transaction_data_hash.clone()) {
            return Err(ChainError::DuplicateTransaction(format!(
                "transaction {} appears twice in block {}",
                tx.transaction_data_hash, block.index
            )));
        }
        if confirmed.contains(&tx.transaction_data_hash) {
            return Err(ChainError::DuplicateTransaction(format!(
                "transaction {} is already confirmed",
                tx.transaction_data_hash
            )));
        }
    }

    let coinbase = &block.transactions[0];
    if coinbase.to != block.mined_by {
        return Err(ChainError::InvalidTransaction(format!(
            "coinbase credits {} but block was mined by {}",
            coinbase.to, block.mined_by
        )));
    }
    let max_reward = BLOCK_REWARD.saturating_add(block.total_fees());
    if coinbase.value > max_reward {
        return Err(ChainError::InvalidTransaction(format!(
            "coinbase value {} exceeds reward + fees ({})",
            coinbase.value, max_reward
        )));
    }

    Ok(())
}
