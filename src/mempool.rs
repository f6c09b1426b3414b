//! Pending-transaction pool
//!
//! Holds unconfirmed transactions in arrival order. Transactions leave the
//! pool only when a block containing them is appended (or when the chain is
//! replaced and they are re-evaluated). Candidate selection for mining jobs
//! reads the pool without draining it.

use crate::error::{ChainError, Result};
use crate::transaction::Transaction;
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct Mempool {
    /// Arrival order; oldest first.
    transactions: Vec<Transaction>,
    hashes: HashSet<String>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transaction in arrival order. The caller is responsible for
    /// structural and balance validation; the pool only guards against
    /// duplicates within itself.
    pub fn add(&mut self, tx: Transaction) -> Result<()> {
        if self.hashes.contains(&tx.transaction_data_hash) {
            return Err(ChainError::DuplicateTransaction(format!(
                "transaction {} is already pending",
                tx.transaction_data_hash
            )));
        }
        self.hashes.insert(tx.transaction_data_hash.clone());
        self.transactions.push(tx);
        Ok(())
    }

    /// Up to `max` pending transactions, oldest first, without removing
    /// them. Removal happens only on confirmation.
    pub fn take(&self, max: usize) -> Vec<Transaction> {
        self.transactions.iter().take(max).cloned().collect()
    }

    /// Drop the given confirmed transactions from the pool.
    pub fn remove_confirmed(&mut self, confirmed: &HashSet<String>) {
        self.transactions
            .retain(|tx| !confirmed.contains(&tx.transaction_data_hash));
        self.hashes.retain(|h| !confirmed.contains(h));
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.hashes.contains(hash)
    }

    pub fn by_hash(&self, hash: &str) -> Option<&Transaction> {
        self.transactions
            .iter()
            .find(|tx| tx.transaction_data_hash == hash)
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
        self.hashes.clear();
    }
}
