//! End-to-end scenarios exercised against the library directly: mining
//! lifecycle, value conservation across blocks, and fork reconciliation
//! between two independently grown chains.

use praxischain::blockchain::{chain_work, Blockchain, BLOCK_REWARD};
use praxischain::crypto::{timestamp_now, COINBASE_ADDRESS};
use praxischain::error::ChainError;
use praxischain::miner::search_nonce;
use praxischain::mining::MinedBlockPayload;
use praxischain::sync::resolve_chain;
use praxischain::transaction::TransactionPayload;
use std::sync::Arc;
use tokio::sync::RwLock;

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

/// Drive the full job/solve/submit cycle once.
fn mine(chain: &mut Blockchain, miner: &str) {
    let job = chain.get_mining_job(miner, 100).unwrap();
    let date_created = timestamp_now();
    let (nonce, block_hash) =
        search_nonce(&job.block_data_hash, &date_created, job.difficulty, u64::MAX).unwrap();
    chain
        .submit_mined_block(MinedBlockPayload {
            block_data_hash: job.block_data_hash,
            date_created,
            nonce,
            block_hash,
        })
        .unwrap();
}

#[test]
fn mine_transact_confirm_lifecycle() {
    let mut chain = Blockchain::new(1).unwrap();
    let alice = addr('a');
    let bob = addr('b');
    let carol = addr('c');

    // Alice mines and gets the block reward.
    mine(&mut chain, &alice);
    assert_eq!(chain.balance_of(&alice), BLOCK_REWARD);

    // She pays Bob; the transfer sits in the pool until mined.
    chain
        .add_new_transaction(payload(&alice, &bob, 2_000_000, 1_000))
        .unwrap();
    assert_eq!(chain.mempool.len(), 1);
    assert_eq!(chain.balance_of(&bob), 0);

    // Carol mines the confirming block and collects reward plus fee.
    mine(&mut chain, &carol);
    assert_eq!(chain.balance_of(&bob), 2_000_000);
    assert_eq!(chain.balance_of(&alice), BLOCK_REWARD - 2_001_000);
    assert_eq!(chain.balance_of(&carol), BLOCK_REWARD + 1_000);
    assert!(chain.mempool.is_empty());

    // Conservation: total supply equals exactly two block rewards, and the
    // reward sentinel never accrues a balance.
    assert_eq!(chain.balances.total_supply(), 2 * BLOCK_REWARD);
    assert_eq!(chain.balance_of(COINBASE_ADDRESS), 0);
}

#[test]
fn sentinel_payout_flows_from_pool_to_confirmation() {
    // A payout sent from the reward sentinel needs no funded sender: it is
    // accepted into the pool, rides the next mining job, and mints value
    // for its recipient once the block confirms.
    let mut chain = Blockchain::new(0).unwrap();
    let alice = addr('a');
    let miner = addr('e');

    let hash = chain
        .add_new_transaction(payload(COINBASE_ADDRESS, &alice, 50, 0))
        .unwrap();

    let job = chain.get_mining_job(&miner, 100).unwrap();
    assert_eq!(job.index, 1);
    assert_eq!(job.transactions_included, 2);
    assert_eq!(job.prev_block_hash, chain.blocks[0].block_hash);

    let date_created = timestamp_now();
    let (nonce, block_hash) =
        search_nonce(&job.block_data_hash, &date_created, job.difficulty, u64::MAX).unwrap();
    chain
        .submit_mined_block(MinedBlockPayload {
            block_data_hash: job.block_data_hash,
            date_created,
            nonce,
            block_hash,
        })
        .unwrap();

    assert_eq!(chain.balance_of(&alice), 50);
    assert!(!chain.mempool.contains(&hash));
    assert!(chain.is_confirmed(&hash));
}

#[test]
fn replayed_chain_reaches_identical_state() {
    let mut chain = Blockchain::new(1).unwrap();
    let alice = addr('a');
    mine(&mut chain, &alice);
    chain
        .add_new_transaction(payload(&alice, &addr('b'), 7_777, 23))
        .unwrap();
    mine(&mut chain, &alice);
    mine(&mut chain, &alice);

    let replayed = Blockchain::from_blocks(&chain.blocks, 1).unwrap();
    assert_eq!(replayed.head().block_hash, chain.head().block_hash);
    assert_eq!(replayed.balance_of(&alice), chain.balance_of(&alice));
    assert_eq!(replayed.balance_of(&addr('b')), 7_777);
}

#[tokio::test]
async fn forked_networks_converge_on_the_heavier_chain() {
    // Two nodes grow independently from the same genesis.
    let mut node_a = Blockchain::new(1).unwrap();
    let mut node_b = Blockchain::new(1).unwrap();

    mine(&mut node_a, &addr('a'));
    mine(&mut node_b, &addr('b'));
    mine(&mut node_b, &addr('b'));

    assert!(chain_work(&node_b.blocks) > chain_work(&node_a.blocks));

    // Node A hears about B's chain and adopts it.
    let shared_a = Arc::new(RwLock::new(node_a));
    let height = resolve_chain(&shared_a, &node_b.blocks).await.unwrap();
    assert_eq!(height, 2);

    let guard = shared_a.read().await;
    assert_eq!(guard.head().block_hash, node_b.head().block_hash);
    assert_eq!(guard.balance_of(&addr('a')), 0);
    assert_eq!(guard.balance_of(&addr('b')), 2 * BLOCK_REWARD);

    // B now hears about the (identical) chain and keeps its own.
    let shared_b = Arc::new(RwLock::new(node_b));
    let blocks = shared_a.read().await.blocks.clone();
    let err = resolve_chain(&shared_b, &blocks).await.unwrap_err();
    assert!(matches!(err, ChainError::ChainRejected(_)));
}

#[tokio::test]
async fn adoption_readmits_transactions_the_winner_lacks() {
    let mut node_a = Blockchain::new(1).unwrap();
    let alice = addr('a');
    mine(&mut node_a, &alice);
    node_a
        .add_new_transaction(payload(&alice, &addr('d'), 50, 5))
        .unwrap();
    let pending_hash = node_a.mempool.pending()[0].transaction_data_hash.clone();

    // The winner also rewarded Alice, so her spend survives adoption.
    let mut node_b = Blockchain::new(1).unwrap();
    mine(&mut node_b, &alice);
    mine(&mut node_b, &alice);

    let shared = Arc::new(RwLock::new(node_a));
    resolve_chain(&shared, &node_b.blocks).await.unwrap();

    // The orphaned transfer is pending again, unconfirmed.
    let guard = shared.read().await;
    let restored = guard.mempool.by_hash(&pending_hash).unwrap();
    assert!(restored.mined_in_block_index.is_none());
    assert!(!restored.transfer_successful);
}

#[test]
fn difficulty_ramps_up_on_a_fast_chain() {
    let mut chain = Blockchain::new(1).unwrap();
    // Ten quick blocks trip the first retarget window.
    for _ in 0..10 {
        mine(&mut chain, &addr('a'));
    }
    assert_eq!(chain.difficulty, 2);
}
