/// Transaction types for praxischain
use crate::crypto::{sha256_hex, timestamp_now, Address, COINBASE_ADDRESS};
use crate::error::ChainError;
use serde::{Deserialize, Serialize};

/// Maximum serialized transaction size in bytes (100KB) to prevent DoS
pub const MAX_TRANSACTION_SIZE: usize = 100_000;

/// Maximum length of the optional data payload
pub const MAX_DATA_LENGTH: usize = 1_024;

/// A native-coin transfer. Wire form is camelCase JSON.
///
/// `transaction_data_hash` covers the immutable fields only (everything
/// except the signature and the confirmation metadata), so the hash is
/// stable across the pending -> confirmed transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub from: Address,
    pub to: Address,
    pub value: u64,
    pub fee: u64,
    pub date_created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_pub_key: Option<String>,
    /// Carried opaquely; never verified by this node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_signature: Option<Vec<String>>,
    pub transaction_data_hash: String,
    /// Index of the containing block once confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mined_in_block_index: Option<u64>,
    #[serde(default)]
    pub transfer_successful: bool,
}

/// Hash input: the immutable transaction fields in fixed order.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TransactionData<'a> {
    from: &'a str,
    to: &'a str,
    value: u64,
    fee: u64,
    date_created: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender_pub_key: Option<&'a str>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        from: Address,
        to: Address,
        value: u64,
        fee: u64,
        date_created: String,
        data: Option<String>,
        sender_pub_key: Option<String>,
        sender_signature: Option<Vec<String>>,
    ) -> Self {
        let mut tx = Transaction {
            from,
            to,
            value,
            fee,
            date_created,
            data,
            sender_pub_key,
            sender_signature,
            transaction_data_hash: String::new(),
            mined_in_block_index: None,
            transfer_successful: false,
        };
        tx.transaction_data_hash = tx.compute_data_hash();
        tx
    }

    /// Recompute the data hash from the immutable fields. Deterministic:
    /// serde_json emits struct fields in declaration order with no
    /// whitespace, so two nodes hash byte-identical input.
    pub fn compute_data_hash(&self) -> String {
        let data = TransactionData {
            from: &self.from,
            to: &self.to,
            value: self.value,
            fee: self.fee,
            date_created: &self.date_created,
            data: self.data.as_deref(),
            sender_pub_key: self.sender_pub_key.as_deref(),
        };
        let json = serde_json::to_string(&data).expect("transaction data serializes");
        sha256_hex(json.as_bytes())
    }

    /// A coinbase (mining reward) transaction sends from the reserved
    /// all-zero address.
    pub fn is_coinbase(&self) -> bool {
        self.from == COINBASE_ADDRESS
    }

    /// Build the reward transaction for a block candidate. The block index
    /// goes into the hashed data payload so that rewards for the same miner
    /// and value in different blocks never collide on identity.
    pub fn coinbase(to: Address, value: u64, block_index: u64) -> Self {
        let mut tx = Transaction::new(
            COINBASE_ADDRESS.to_string(),
            to,
            value,
            0,
            timestamp_now(),
            Some(format!("coinbase tx, block {}", block_index)),
            None,
            None,
        );
        tx.mined_in_block_index = Some(block_index);
        tx.transfer_successful = true;
        tx
    }

    /// Reject oversized transactions before they reach the pool.
    pub fn validate_size(&self) -> Result<(), ChainError> {
        let serialized = bincode::serialize(self)
            .map_err(|e| ChainError::MalformedTransaction(format!("serialization failed: {}", e)))?;

        if serialized.len() > MAX_TRANSACTION_SIZE {
            return Err(ChainError::MalformedTransaction(format!(
                "transaction too large: {} bytes (max: {})",
                serialized.len(),
                MAX_TRANSACTION_SIZE
            )));
        }
        Ok(())
    }
}

/// Incoming submission as posted to `/transaction/send`. The node computes
/// the data hash itself; a client-supplied hash is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    pub from: Address,
    pub to: Address,
    pub value: u64,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub sender_pub_key: Option<String>,
    #[serde(default)]
    pub sender_signature: Option<Vec<String>>,
}

impl TransactionPayload {
    pub fn into_transaction(self) -> Transaction {
        let date_created = self.date_created.unwrap_or_else(timestamp_now);
        Transaction::new(
            self.from,
            self.to,
            self.value,
            self.fee,
            date_created,
            self.data,
            self.sender_pub_key,
            self.sender_signature,
        )
    }
}
