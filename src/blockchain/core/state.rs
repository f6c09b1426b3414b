use crate::crypto::Address;
use crate::error::ChainError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Derived account balances: a pure projection over confirmed transactions.
/// Never mutated independently of the chain; every append or replacement
/// either replays into it or rebuilds it from scratch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSheet {
    balances: HashMap<Address, u64>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit the recipient and, unless the sender is the coinbase
    /// sentinel, debit the sender by `value + fee`. Fails without mutating
    /// anything when the sender cannot cover the debit.
    pub fn apply_transaction(&mut self, tx: &Transaction) -> Result<(), ChainError> {
        if !tx.is_coinbase() {
            let debit = tx.value.checked_add(tx.fee).ok_or_else(|| {
                ChainError::InvalidTransaction("value + fee overflows".to_string())
            })?;
            let available = self.balance_of(&tx.from);
            if available < debit {
                return Err(ChainError::InvalidTransaction(format!(
                    "insufficient balance: {} has {} micro-coins, needs {}",
                    tx.from, available, debit
                )));
            }
            *self.balances.entry(tx.from.clone()).or_insert(0) = available - debit;
        }
        *self.balances.entry(tx.to.clone()).or_insert(0) += tx.value;
        Ok(())
    }

    /// Rebuild from a full block sequence. Only used on chains that already
    /// passed validation, so replay cannot fail.
    pub fn rebuild(&mut self, blocks: &[crate::blockchain::Block]) {
        self.balances.clear();
        for block in blocks {
            for tx in &block.transactions {
                // Validated blocks never contain unaffordable spends.
                let _ = self.apply_transaction(tx);
            }
        }
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        *self.balances.get(address).unwrap_or(&0)
    }

    pub fn all(&self) -> &HashMap<Address, u64> {
        &self.balances
    }

    /// Total coins across all accounts; equals total reward issuance since
    /// transfers conserve value.
    pub fn total_supply(&self) -> u64 {
        self.balances.values().sum()
    }
}
