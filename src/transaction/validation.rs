//! Structural transaction checks shared by the pool and block validation

use crate::crypto::is_valid_address;
use crate::error::ChainError;
use crate::transaction::types::{Transaction, MAX_DATA_LENGTH};

/// Validate everything that can be checked without chain state: field
/// formats, self-transfers, coinbase fee rules, the stored data hash, and
/// the size cap. Balance and duplicate checks happen at the chain boundary.
pub fn validate_structure(tx: &Transaction) -> Result<(), ChainError> {
    if !is_valid_address(&tx.from) {
        return Err(ChainError::MalformedTransaction(format!(
            "invalid sender address: {}",
            tx.from
        )));
    }
    if !is_valid_address(&tx.to) {
        return Err(ChainError::MalformedTransaction(format!(
            "invalid recipient address: {}",
            tx.to
        )));
    }
    if tx.from == tx.to && !tx.is_coinbase() {
        return Err(ChainError::MalformedTransaction(
            "sender and recipient must differ".to_string(),
        ));
    }
    if tx.is_coinbase() && tx.fee != 0 {
        return Err(ChainError::MalformedTransaction(
            "coinbase transactions carry no fee".to_string(),
        ));
    }
    if tx.date_created.is_empty() {
        return Err(ChainError::MalformedTransaction(
            "dateCreated must be set".to_string(),
        ));
    }
    if let Some(data) = &tx.data {
        if data.len() > MAX_DATA_LENGTH {
            return Err(ChainError::MalformedTransaction(format!(
                "data payload exceeds {} bytes",
                MAX_DATA_LENGTH
            )));
        }
    }
    if tx.transaction_data_hash != tx.compute_data_hash() {
        return Err(ChainError::MalformedTransaction(
            "transactionDataHash does not match transaction fields".to_string(),
        ));
    }
    tx.validate_size()?;
    Ok(())
}
