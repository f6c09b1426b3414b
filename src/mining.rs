//! Mining-job issuance and solved-block intake.
//!
//! The node prepares full block candidates and hands miners only the fields
//! they need to grind on. An issued job stays valid until the head advances;
//! `Blockchain::append` clears the job book, so a solution for an old head
//! comes back as a stale job rather than a hard validation failure.

use crate::blockchain::{Block, Blockchain, BLOCK_REWARD};
use crate::crypto::{is_valid_address, is_valid_hash, Address};
use crate::error::ChainError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// What a miner receives from `/mining/get-mining-job/{address}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiningJob {
    pub index: u64,
    pub transactions_included: usize,
    pub difficulty: u32,
    pub expected_reward: u64,
    pub reward_address: Address,
    pub block_data_hash: String,
    pub prev_block_hash: String,
}

/// What a miner posts back to `/mining/submit-mined-block`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinedBlockPayload {
    pub block_data_hash: String,
    pub date_created: String,
    pub nonce: u64,
    pub block_hash: String,
}

impl Blockchain {
    /// Assemble a candidate for the next block and register it in the job
    /// book, keyed by its `blockDataHash`. Pool transactions are selected
    /// oldest-first, capped at `pending_tx_limit`, and the coinbase reward
    /// collects the block reward plus their fees.
    pub fn get_mining_job(
        &mut self,
        miner: &str,
        pending_tx_limit: usize,
    ) -> Result<MiningJob, ChainError> {
        if !is_valid_address(miner) {
            return Err(ChainError::MalformedTransaction(format!(
                "invalid reward address: {}",
                miner
            )));
        }

        let index = self.height() + 1;

        // Replay candidates against the current balances so a spend that
        // became unaffordable since submission cannot invalidate the block.
        let mut temp_balances = self.balances.clone();
        let mut included = Vec::new();
        for tx in self.mempool.take(pending_tx_limit) {
            if temp_balances.apply_transaction(&tx).is_ok() {
                included.push(tx);
            }
        }
        let fees: u64 = included.iter().map(|tx| tx.fee).sum();

        let mut transactions =
            vec![Transaction::coinbase(miner.to_string(), BLOCK_REWARD + fees, index)];
        for mut tx in included {
            tx.mined_in_block_index = Some(index);
            tx.transfer_successful = true;
            transactions.push(tx);
        }

        let candidate = Block::candidate(
            index,
            transactions,
            self.difficulty,
            self.head().block_hash.clone(),
            miner.to_string(),
        );

        let job = MiningJob {
            index: candidate.index,
            transactions_included: candidate.transactions.len(),
            difficulty: candidate.difficulty,
            expected_reward: BLOCK_REWARD + fees,
            reward_address: candidate.mined_by.clone(),
            block_data_hash: candidate.block_data_hash.clone(),
            prev_block_hash: candidate.prev_block_hash.clone(),
        };
        self.mining_jobs
            .insert(candidate.block_data_hash.clone(), candidate);
        Ok(job)
    }

    /// Accept a solved job. The stored candidate is the source of truth for
    /// the block content; the miner only contributes nonce and timestamp,
    /// so a forged transaction list cannot ride in on a submission.
    pub fn submit_mined_block(&mut self, payload: MinedBlockPayload) -> Result<&Block, ChainError> {
        if !is_valid_hash(&payload.block_data_hash) || !is_valid_hash(&payload.block_hash) {
            return Err(ChainError::InvalidDataHash(
                "submitted hashes must be 64 hex digits".to_string(),
            ));
        }

        let candidate = self
            .mining_jobs
            .get(&payload.block_data_hash)
            .cloned()
            .ok_or_else(|| {
                ChainError::StaleJob(format!(
                    "no open mining job for blockDataHash {}",
                    payload.block_data_hash
                ))
            })?;

        let sealed = candidate.sealed(payload.nonce, payload.date_created);
        if sealed.block_hash != payload.block_hash {
            return Err(ChainError::InvalidDataHash(format!(
                "submitted blockHash {} does not match recomputed {}",
                payload.block_hash, sealed.block_hash
            )));
        }
        if !sealed.meets_difficulty() {
            return Err(ChainError::InvalidProofOfWork(format!(
                "blockHash {} does not meet difficulty {}",
                sealed.block_hash, sealed.difficulty
            )));
        }
        if sealed.prev_block_hash != self.head().block_hash {
            return Err(ChainError::StaleJob(
                "the chain head moved past this job".to_string(),
            ));
        }

        self.append(sealed)
    }
}
