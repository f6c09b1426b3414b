use crate::crypto::{sha256_hex, timestamp_now, Address, COINBASE_ADDRESS, ZERO_HASH};
use crate::error::ChainError;
use crate::mempool::Mempool;
use crate::persistence::{InMemoryPersistence, Persistence};
use crate::transaction::{Transaction, TransactionPayload};
use chrono::DateTime;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::blockchain::core::state::BalanceSheet;
use crate::blockchain::core::validation::validate_block_transactions;

/// Fixed per-block reward in micro-coins; fees are paid on top of it.
pub const BLOCK_REWARD: u64 = 5_000_000;

/// Timestamp of the genesis block, shared by every node of a network.
pub const GENESIS_DATE: &str = "2024-01-01T00:00:00.000Z";

pub const DIFFICULTY_ADJUSTMENT_INTERVAL: u64 = 10;
pub const TARGET_BLOCK_TIME_SECS: i64 = 30;
pub const MIN_DIFFICULTY: u32 = 1;
pub const MAX_DIFFICULTY: u32 = 7;

/// One unit of chain data. Hashes are 64-hex SHA-256 strings:
///
/// * `block_data_hash` covers `{index, transactions, difficulty,
///   prevBlockHash, minedBy}` as canonical JSON. The real transaction list
///   is part of the input — an earlier generation of this system hashed a
///   hard-coded empty list, which silently decoupled the integrity hash
///   from the ledger content, so hashes here are intentionally not
///   compatible with it.
/// * `block_hash` covers `"{blockDataHash}|{dateCreated}|{nonce}"` and is
///   the value the proof-of-work search grinds on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub difficulty: u32,
    pub prev_block_hash: String,
    pub mined_by: Address,
    pub nonce: u64,
    pub date_created: String,
    pub block_data_hash: String,
    pub block_hash: String,
}

/// Canonical hash input for `block_data_hash`; field order is fixed by the
/// struct declaration and serde_json emits no whitespace.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockData<'a> {
    index: u64,
    transactions: &'a [Transaction],
    difficulty: u32,
    prev_block_hash: &'a str,
    mined_by: &'a str,
}

impl Block {
    /// An unmined candidate: nonce 0, timestamped now, both hashes filled
    /// in so miners can grind on `block_data_hash` immediately.
    pub fn candidate(
        index: u64,
        transactions: Vec<Transaction>,
        difficulty: u32,
        prev_block_hash: String,
        mined_by: Address,
    ) -> Self {
        let mut block = Block {
            index,
            transactions,
            difficulty,
            prev_block_hash,
            mined_by,
            nonce: 0,
            date_created: timestamp_now(),
            block_data_hash: String::new(),
            block_hash: String::new(),
        };
        block.block_data_hash = block.compute_block_data_hash();
        block.block_hash = block.compute_block_hash();
        block
    }

    pub fn compute_block_data_hash(&self) -> String {
        let data = BlockData {
            index: self.index,
            transactions: &self.transactions,
            difficulty: self.difficulty,
            prev_block_hash: &self.prev_block_hash,
            mined_by: &self.mined_by,
        };
        let json = serde_json::to_string(&data).expect("block data serializes");
        sha256_hex(json.as_bytes())
    }

    pub fn compute_block_hash(&self) -> String {
        let input = format!("{}|{}|{}", self.block_data_hash, self.date_created, self.nonce);
        sha256_hex(input.as_bytes())
    }

    /// A solved copy of this block: the miner's nonce and timestamp, with
    /// the outer hash recomputed.
    pub fn sealed(&self, nonce: u64, date_created: String) -> Block {
        let mut block = self.clone();
        block.nonce = nonce;
        block.date_created = date_created;
        block.block_hash = block.compute_block_hash();
        block
    }

    /// Proof-of-work check: at least `difficulty` leading zero hex digits.
    pub fn meets_difficulty(&self) -> bool {
        leading_zero_digits(&self.block_hash) >= self.difficulty
    }

    /// Work contributed to fork choice: each extra zero digit is a 16x
    /// increase in expected hashing effort.
    pub fn work(&self) -> u64 {
        16u64.saturating_pow(self.difficulty)
    }

    pub fn total_fees(&self) -> u64 {
        self.transactions.iter().map(|tx| tx.fee).sum()
    }
}

pub fn leading_zero_digits(hash: &str) -> u32 {
    hash.bytes().take_while(|b| *b == b'0').count() as u32
}

/// Total work of a block sequence, the fork-choice metric.
pub fn chain_work(blocks: &[Block]) -> u64 {
    blocks.iter().fold(0u64, |acc, b| acc.saturating_add(b.work()))
}

static GENESIS: Lazy<Block> = Lazy::new(|| {
    let mut block = Block {
        index: 0,
        transactions: Vec::new(),
        difficulty: 0,
        prev_block_hash: ZERO_HASH.to_string(),
        mined_by: COINBASE_ADDRESS.to_string(),
        nonce: 0,
        date_created: GENESIS_DATE.to_string(),
        block_data_hash: String::new(),
        block_hash: String::new(),
    };
    block.block_data_hash = block.compute_block_data_hash();
    block.block_hash = block.compute_block_hash();
    block
});

/// The fixed, transaction-free block every chain starts from. Its hash is
/// the chain id that peers compare during handshakes.
pub fn genesis_block() -> &'static Block {
    &GENESIS
}

/// The validated chain plus the state derived from it: pending pool,
/// balance projection, open mining jobs. All structural mutation funnels
/// through `append` or `reset`; readers see a consistent snapshot.
pub struct Blockchain {
    pub blocks: Vec<Block>,
    /// Difficulty assigned to the next issued mining job.
    pub difficulty: u32,
    pub mempool: Mempool,
    pub balances: BalanceSheet,
    /// Issued candidates keyed by `blockDataHash`; cleared whenever the
    /// head advances so stale solutions are rejected.
    pub mining_jobs: HashMap<String, Block>,
    pub persistence: Box<dyn Persistence>,
    confirmed_hashes: HashSet<String>,
    start_difficulty: u32,
}

impl Clone for Blockchain {
    fn clone(&self) -> Self {
        Self {
            blocks: self.blocks.clone(),
            difficulty: self.difficulty,
            mempool: self.mempool.clone(),
            balances: self.balances.clone(),
            mining_jobs: self.mining_jobs.clone(),
            // Persistence cannot be cloned as a trait object; clones run in memory.
            persistence: Box::new(InMemoryPersistence::new()),
            confirmed_hashes: self.confirmed_hashes.clone(),
            start_difficulty: self.start_difficulty,
        }
    }
}

impl Blockchain {
    /// A fresh chain at genesis with an in-memory persistence backend.
    pub fn new(start_difficulty: u32) -> Result<Self, ChainError> {
        Self::new_with_persistence(start_difficulty, Box::new(InMemoryPersistence::new()))
    }

    pub fn new_with_persistence(
        start_difficulty: u32,
        persistence: Box<dyn Persistence>,
    ) -> Result<Self, ChainError> {
        let mut chain = Blockchain {
            blocks: Vec::new(),
            difficulty: start_difficulty,
            mempool: Mempool::new(),
            balances: BalanceSheet::new(),
            mining_jobs: HashMap::new(),
            persistence,
            confirmed_hashes: HashSet::new(),
            start_difficulty,
        };
        chain.append(genesis_block().clone())?;
        Ok(chain)
    }

    /// Replay an externally supplied block sequence from genesis, checking
    /// every invariant in order. Returns the rebuilt chain, or the first
    /// violation (the error message carries the offending block index).
    /// Used both when loading persisted state and when evaluating a peer's
    /// chain.
    pub fn from_blocks(blocks: &[Block], start_difficulty: u32) -> Result<Self, ChainError> {
        let first = blocks.first().ok_or_else(|| {
            ChainError::InvalidLinkage("candidate chain is empty".to_string())
        })?;
        if first.block_hash != genesis_block().block_hash {
            return Err(ChainError::InvalidLinkage(
                "candidate chain starts from a different genesis".to_string(),
            ));
        }

        let mut chain = Self::new(start_difficulty)?;
        for block in &blocks[1..] {
            chain
                .append(block.clone())
                .map_err(|e| annotate_block_error(e, block.index))?;
        }
        Ok(chain)
    }

    /// Validate a block sequence without keeping the result.
    pub fn validate_full(blocks: &[Block], start_difficulty: u32) -> Result<(), ChainError> {
        Self::from_blocks(blocks, start_difficulty).map(|_| ())
    }

    pub fn head(&self) -> &Block {
        self.blocks.last().expect("chain always contains genesis")
    }

    pub fn height(&self) -> u64 {
        self.head().index
    }

    /// The difficulty this chain was configured to start from.
    pub fn start_difficulty(&self) -> u32 {
        self.start_difficulty
    }

    /// Hash of the genesis block; identifies the network.
    pub fn chain_id(&self) -> &str {
        &self.blocks[0].block_hash
    }

    pub fn cumulative_work(&self) -> u64 {
        chain_work(&self.blocks)
    }

    /// Validate `block` against the current head and commit it. Checks, in
    /// order: linkage, stored-hash integrity, proof of work, per-block
    /// transaction rules, and spend affordability replayed against a
    /// temporary balance sheet. Nothing is mutated until every check has
    /// passed.
    pub fn append(&mut self, block: Block) -> Result<&Block, ChainError> {
        let is_genesis = block.index == 0;

        if !is_genesis {
            let head = self.blocks.last().ok_or_else(|| {
                ChainError::InvalidLinkage("cannot append to an empty chain".to_string())
            })?;
            if block.index != head.index + 1 {
                return Err(ChainError::InvalidLinkage(format!(
                    "expected index {}, got {}",
                    head.index + 1,
                    block.index
                )));
            }
            if block.prev_block_hash != head.block_hash {
                return Err(ChainError::InvalidLinkage(format!(
                    "prevBlockHash {} does not match head {}",
                    block.prev_block_hash, head.block_hash
                )));
            }
        } else if !self.blocks.is_empty() {
            return Err(ChainError::InvalidLinkage(
                "genesis can only start an empty chain".to_string(),
            ));
        }

        if block.block_data_hash != block.compute_block_data_hash() {
            return Err(ChainError::InvalidDataHash(format!(
                "blockDataHash of block {} is not reproducible from its fields",
                block.index
            )));
        }
        if block.block_hash != block.compute_block_hash() {
            return Err(ChainError::InvalidDataHash(format!(
                "blockHash of block {} is not reproducible from its fields",
                block.index
            )));
        }

        if !block.meets_difficulty() {
            return Err(ChainError::InvalidProofOfWork(format!(
                "blockHash {} does not meet difficulty {}",
                block.block_hash, block.difficulty
            )));
        }

        validate_block_transactions(&block, &self.confirmed_hashes)?;

        let mut temp_balances = self.balances.clone();
        for tx in &block.transactions {
            temp_balances.apply_transaction(tx)?;
        }

        let confirmed: HashSet<String> = block
            .transactions
            .iter()
            .map(|tx| tx.transaction_data_hash.clone())
            .collect();

        self.blocks.push(block);
        self.balances = temp_balances;
        self.confirmed_hashes.extend(confirmed.iter().cloned());
        self.mempool.remove_confirmed(&confirmed);
        // Every issued job referenced the old head; force fresh ones.
        self.mining_jobs.clear();

        let appended = self.blocks.last().expect("block was just pushed");
        let _ = self.persistence.save_block(appended);
        let _ = self.persistence.save_pending(self.mempool.pending());

        self.adjust_difficulty();

        Ok(self.blocks.last().expect("block was just pushed"))
    }

    /// Validate a submitted transaction against chain state and admit it to
    /// the pool. Returns its `transactionDataHash`.
    pub fn add_new_transaction(&mut self, payload: TransactionPayload) -> Result<String, ChainError> {
        let tx = payload.into_transaction();
        crate::transaction::validate_structure(&tx)?;

        let hash = tx.transaction_data_hash.clone();
        if self.mempool.contains(&hash) || self.is_confirmed(&hash) {
            return Err(ChainError::DuplicateTransaction(format!(
                "transaction {} already exists",
                hash
            )));
        }

        if !tx.is_coinbase() {
            let needed = tx.value.checked_add(tx.fee).ok_or_else(|| {
                ChainError::InvalidTransaction("value + fee overflows".to_string())
            })?;
            let available = self.balances.balance_of(&tx.from);
            if available < needed {
                return Err(ChainError::InvalidTransaction(format!(
                    "insufficient balance: {} has {} micro-coins, needs {}",
                    tx.from, available, needed
                )));
            }
        }

        self.mempool.add(tx)?;
        let _ = self.persistence.save_pending(self.mempool.pending());
        Ok(hash)
    }

    /// Discard everything after genesis. Administrative recovery only.
    pub fn reset(&mut self) {
        self.blocks.truncate(1);
        self.difficulty = self.start_difficulty;
        self.mempool.clear();
        self.balances.rebuild(&self.blocks);
        self.mining_jobs.clear();
        self.confirmed_hashes.clear();
        let _ = self.persistence.replace_chain(&self.blocks);
        let _ = self.persistence.save_pending(self.mempool.pending());
    }

    // ------------------------------------------------------------------
    // Read-only lookups over confirmed (and, where noted, pending) state
    // ------------------------------------------------------------------

    pub fn block_by_index(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    pub fn confirmed_transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.blocks.iter().flat_map(|b| b.transactions.iter())
    }

    pub fn confirmed_transaction_count(&self) -> usize {
        self.blocks.iter().map(|b| b.transactions.len()).sum()
    }

    pub fn is_confirmed(&self, hash: &str) -> bool {
        self.confirmed_hashes.contains(hash)
    }

    /// Confirmed first, then pending.
    pub fn transaction_by_hash(&self, hash: &str) -> Option<&Transaction> {
        self.confirmed_transactions()
            .find(|tx| tx.transaction_data_hash == hash)
            .or_else(|| self.mempool.by_hash(hash))
    }

    /// All transactions touching `address`, confirmed and pending, in
    /// dateCreated order (RFC 3339 strings sort chronologically).
    pub fn transactions_by_address(&self, address: &str) -> Vec<Transaction> {
        let mut result: Vec<Transaction> = self
            .confirmed_transactions()
            .chain(self.mempool.pending().iter())
            .filter(|tx| tx.from == address || tx.to == address)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.date_created.cmp(&b.date_created));
        result
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.balances.balance_of(address)
    }

    fn adjust_difficulty(&mut self) {
        let height = self.head().index;
        if height == 0 || height % DIFFICULTY_ADJUSTMENT_INTERVAL != 0 {
            return;
        }
        let window_start = &self.blocks[(height - DIFFICULTY_ADJUSTMENT_INTERVAL) as usize];
        let start = DateTime::parse_from_rfc3339(&window_start.date_created);
        let end = DateTime::parse_from_rfc3339(&self.head().date_created);
        let (Ok(start), Ok(end)) = (start, end) else {
            return;
        };
        let actual = (end - start).num_seconds().max(1);
        let expected = DIFFICULTY_ADJUSTMENT_INTERVAL as i64 * TARGET_BLOCK_TIME_SECS;

        // One hex digit is a 16x work change, so step by single digits.
        if actual > expected * 2 && self.difficulty > MIN_DIFFICULTY {
            self.difficulty -= 1;
        } else if actual * 2 < expected && self.difficulty < MAX_DIFFICULTY {
            self.difficulty += 1;
        }
    }
}

fn annotate_block_error(err: ChainError, index: u64) -> ChainError {
    match err {
        ChainError::InvalidLinkage(msg) => {
            ChainError::InvalidLinkage(format!("block {}: {}", index, msg))
        }
        ChainError::InvalidProofOfWork(msg) => {
            ChainError::InvalidProofOfWork(format!("block {}: {}", index, msg))
        }
        ChainError::InvalidDataHash(msg) => {
            ChainError::InvalidDataHash(format!("block {}: {}", index, msg))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(c: char) -> String {
        std::iter::repeat(c).take(40).collect()
    }

    fn payload(from: &str, to: &str, value: u64, fee: u64) -> TransactionPayload {
        TransactionPayload {
            from: from.to_string(),
            to: to.to_string(),
            value,
            fee,
            date_created: Some(timestamp_now()),
            data: None,
            sender_pub_key: None,
            sender_signature: None,
        }
    }

    /// Build a valid successor at difficulty 0, confirming up to `max_txs`
    /// pooled transactions plus the coinbase reward.
    fn mined_successor(chain: &Blockchain, miner: &str, max_txs: usize) -> Block {
        let index = chain.height() + 1;
        let pool = chain.mempool.take(max_txs);
        let fees: u64 = pool.iter().map(|tx| tx.fee).sum();

        let mut transactions =
            vec![Transaction::coinbase(miner.to_string(), BLOCK_REWARD + fees, index)];
        for mut tx in pool {
            tx.mined_in_block_index = Some(index);
            tx.transfer_successful = true;
            transactions.push(tx);
        }

        Block::candidate(
            index,
            transactions,
            0,
            chain.head().block_hash.clone(),
            miner.to_string(),
        )
    }

    #[test]
    fn genesis_is_deterministic() {
        let a = Blockchain::new(0).unwrap();
        let b = Blockchain::new(0).unwrap();
        assert_eq!(a.chain_id(), b.chain_id());
        assert_eq!(a.head().index, 0);
        assert_eq!(a.head().prev_block_hash, ZERO_HASH);
        assert!(a.head().transactions.is_empty());
    }

    #[test]
    fn appending_a_block_credits_the_miner() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');

        let block = mined_successor(&chain, &miner, 10);
        chain.append(block).unwrap();

        assert_eq!(chain.height(), 1);
        assert_eq!(chain.balance_of(&miner), BLOCK_REWARD);
        assert_eq!(chain.confirmed_transaction_count(), 1);
    }

    #[test]
    fn append_rejects_bad_linkage() {
        let mut chain = Blockchain::new(0).unwrap();
        let mut block = mined_successor(&chain, &addr('a'), 10);
        block.prev_block_hash = sha256_hex(b"somewhere else");
        block.block_data_hash = block.compute_block_data_hash();
        block.block_hash = block.compute_block_hash();

        let err = chain.append(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidLinkage(_)));
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn append_rejects_tampered_transactions() {
        let mut chain = Blockchain::new(0).unwrap();
        let mut block = mined_successor(&chain, &addr('a'), 10);
        // Inflate the reward after the data hash was computed.
        block.transactions[0].value += 1;

        let err = chain.append(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidDataHash(_)));
    }

    #[test]
    fn append_rejects_unreproducible_block_hash() {
        let mut chain = Blockchain::new(0).unwrap();
        let mut block = mined_successor(&chain, &addr('a'), 10);
        block.nonce += 1;

        let err = chain.append(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidDataHash(_)));
    }

    #[test]
    fn transfer_moves_value_and_fee() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');
        let recipient = addr('b');

        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        chain
            .add_new_transaction(payload(&miner, &recipient, 1_000_000, 500))
            .unwrap();

        let second_miner = addr('c');
        chain.append(mined_successor(&chain, &second_miner, 10)).unwrap();

        assert_eq!(chain.balance_of(&recipient), 1_000_000);
        assert_eq!(chain.balance_of(&miner), BLOCK_REWARD - 1_000_000 - 500);
        assert_eq!(chain.balance_of(&second_miner), BLOCK_REWARD + 500);
        assert!(chain.mempool.is_empty());
    }

    #[test]
    fn supply_grows_only_by_the_block_reward() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');

        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        chain
            .add_new_transaction(payload(&miner, &addr('b'), 2_000_000, 100))
            .unwrap();
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();

        assert_eq!(chain.balances.total_supply(), 2 * BLOCK_REWARD);
    }

    #[test]
    fn pending_spend_requires_sufficient_balance() {
        let mut chain = Blockchain::new(0).unwrap();
        let err = chain
            .add_new_transaction(payload(&addr('a'), &addr('b'), 1, 1))
            .unwrap_err();
        assert!(matches!(err, ChainError::InvalidTransaction(_)));
        assert!(chain.mempool.is_empty());
    }

    #[test]
    fn duplicate_submission_is_rejected_pending_and_confirmed() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();

        let p = payload(&miner, &addr('b'), 100, 10);
        chain.add_new_transaction(p.clone()).unwrap();
        let err = chain.add_new_transaction(p.clone()).unwrap_err();
        assert!(matches!(err, ChainError::DuplicateTransaction(_)));

        // Confirm it, then try again: still a duplicate.
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        let err = chain.add_new_transaction(p).unwrap_err();
        assert!(matches!(err, ChainError::DuplicateTransaction(_)));
    }

    #[test]
    fn from_blocks_replays_a_valid_chain() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        chain
            .add_new_transaction(payload(&miner, &addr('b'), 42, 1))
            .unwrap();
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();

        let rebuilt = Blockchain::from_blocks(&chain.blocks, 0).unwrap();
        assert_eq!(rebuilt.height(), chain.height());
        assert_eq!(rebuilt.balance_of(&addr('b')), 42);
        assert_eq!(rebuilt.cumulative_work(), chain.cumulative_work());
    }

    #[test]
    fn from_blocks_rejects_foreign_genesis() {
        let chain = Blockchain::new(0).unwrap();
        let mut blocks = chain.blocks.clone();
        blocks[0].nonce = 7;
        blocks[0].block_hash = blocks[0].compute_block_hash();

        let Err(err) = Blockchain::from_blocks(&blocks, 0) else {
            panic!("foreign genesis must be rejected");
        };
        assert!(matches!(err, ChainError::InvalidLinkage(_)));
    }

    #[test]
    fn from_blocks_rejects_a_tampered_middle_block() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();

        let mut blocks = chain.blocks.clone();
        blocks[1].transactions[0].value *= 2;

        assert!(Blockchain::validate_full(&blocks, 0).is_err());
    }

    #[test]
    fn block_without_leading_coinbase_is_rejected() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');

        let mut tx = payload(&addr('b'), &addr('c'), 5, 1).into_transaction();
        tx.mined_in_block_index = Some(1);
        tx.transfer_successful = true;
        let block = Block::candidate(1, vec![tx], 0, chain.head().block_hash.clone(), miner);

        let err = chain.append(block).unwrap_err();
        assert!(matches!(err, ChainError::InvalidTransaction(_)));
    }

    #[test]
    fn pooled_sentinel_transaction_is_minable() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');

        // A reward-sentinel payout enters the pool without a funded sender
        // and must still confirm in the next block.
        chain
            .add_new_transaction(payload(COINBASE_ADDRESS, &addr('b'), 50, 0))
            .unwrap();
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();

        assert_eq!(chain.balance_of(&addr('b')), 50);
        assert!(chain.mempool.is_empty());
        assert_eq!(chain.head().transactions.len(), 2);
    }

    #[test]
    fn reset_returns_to_genesis() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        chain
            .add_new_transaction(payload(&miner, &addr('b'), 7, 1))
            .unwrap();

        chain.reset();
        assert_eq!(chain.height(), 0);
        assert!(chain.mempool.is_empty());
        assert_eq!(chain.balance_of(&miner), 0);
    }

    #[test]
    fn work_scales_with_difficulty() {
        assert_eq!(leading_zero_digits("00ab"), 2);
        assert_eq!(leading_zero_digits("ab"), 0);

        let mut block = genesis_block().clone();
        assert_eq!(block.work(), 1);
        block.difficulty = 3;
        assert_eq!(block.work(), 4096);
    }

    #[test]
    fn transactions_by_address_merges_confirmed_and_pending() {
        let mut chain = Blockchain::new(0).unwrap();
        let miner = addr('a');
        chain.append(mined_successor(&chain, &miner, 10)).unwrap();
        chain
            .add_new_transaction(payload(&miner, &addr('b'), 5, 1))
            .unwrap();

        let history = chain.transactions_by_address(&miner);
        assert_eq!(history.len(), 2);
        // Coinbase was created first.
        assert!(history[0].is_coinbase());
        assert!(history[1].mined_in_block_index.is_none());
    }
}
