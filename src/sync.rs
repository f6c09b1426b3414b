//! Peer bookkeeping and longest-valid-chain reconciliation.
//!
//! Fork choice is cumulative work, not block count: a peer's chain replaces
//! the local one only when it carries strictly more work AND replays cleanly
//! from genesis. Ties keep the local chain, so two equally-long forks never
//! oscillate.

use crate::blockchain::{chain_work, Block, Blockchain};
use crate::error::ChainError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Disconnected,
    Connected,
    Synchronizing,
    Synced,
}

/// What the node knows about one peer.
#[derive(Debug, Clone)]
pub struct PeerInfo {
    pub url: String,
    pub node_id: String,
    pub state: PeerState,
    pub height: u64,
    pub cumulative_work: u64,
    pub last_seen: Instant,
    pub failures: u32,
}

impl PeerInfo {
    pub fn new(url: String, node_id: String) -> Self {
        Self {
            url,
            node_id,
            state: PeerState::Connected,
            height: 0,
            cumulative_work: 0,
            last_seen: Instant::now(),
            failures: 0,
        }
    }

    pub fn is_unreliable(&self) -> bool {
        self.failures >= 3
    }

    pub fn is_stale(&self) -> bool {
        self.last_seen.elapsed() > Duration::from_secs(300)
    }
}

/// Shared peer table; the API layer and the background sync loop both hold
/// handles to it.
#[derive(Clone, Default)]
pub struct PeerSyncManager {
    peers: Arc<RwLock<HashMap<String, PeerInfo>>>,
}

impl PeerSyncManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peer keyed by URL. Re-registering an already known peer
    /// is an error so accidental double-connections surface to the caller.
    pub async fn register_peer(&self, url: &str, node_id: &str) -> Result<(), ChainError> {
        let mut peers = self.peers.write().await;
        if peers.contains_key(url) {
            return Err(ChainError::DuplicatePeer(format!(
                "peer {} already registered",
                url
            )));
        }
        peers.insert(url.to_string(), PeerInfo::new(url.to_string(), node_id.to_string()));
        info!(peer = url, "registered peer");
        Ok(())
    }

    pub async fn remove_peer(&self, url: &str) -> bool {
        self.peers.write().await.remove(url).is_some()
    }

    pub async fn peer_urls(&self) -> Vec<String> {
        self.peers.read().await.keys().cloned().collect()
    }

    pub async fn peers(&self) -> Vec<PeerInfo> {
        self.peers.read().await.values().cloned().collect()
    }

    pub async fn peer_count(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn update_peer(&self, url: &str, height: u64, cumulative_work: u64) {
        let mut peers = self.peers.write().await;
        if let Some(peer) = peers.get_mut(url) {
            peer.height = height;
            peer.cumulative_work = cumulative_work;
            peer.last_seen = Instant::now();
            peer.failures = 0;
            peer.state = PeerState::Synced;
        }
    }

    pub async fn set_state(&self, url: &str, state: PeerState) {
        let mut peers = self.peers.write().await;
        if let Some(peer) = peers.get_mut(url) {
            peer.state = state;
        }
    }

    pub async fn mark_failure(&self, url: &str) {
        let mut peers = self.peers.write().await;
        if let Some(peer) = peers.get_mut(url) {
            peer.failures += 1;
            peer.state = PeerState::Disconnected;
            if peer.is_unreliable() {
                warn!(peer = url, failures = peer.failures, "peer marked unreliable");
            }
        }
    }

    /// The reachable peer advertising the most work, if any.
    pub async fn best_peer(&self) -> Option<PeerInfo> {
        let peers = self.peers.read().await;
        peers
            .values()
            .filter(|p| !p.is_unreliable() && !p.is_stale())
            .max_by_key(|p| p.cumulative_work)
            .cloned()
    }
}

/// Evaluate a peer's full chain against the local one and adopt it if it
/// wins fork choice. Runs entirely under the chain write lock so readers
/// never observe a half-swapped state.
///
/// On adoption, transactions that were pending locally, plus any that were
/// confirmed locally but are absent from the winning chain, are re-admitted
/// to the pool with their confirmation metadata cleared. Returns the new
/// chain height.
pub async fn resolve_chain(
    chain: &Arc<RwLock<Blockchain>>,
    remote_blocks: &[Block],
) -> Result<u64, ChainError> {
    let mut guard = chain.write().await;

    let local_work = guard.cumulative_work();
    let remote_work = chain_work(remote_blocks);
    if remote_work <= local_work {
        return Err(ChainError::ChainRejected(format!(
            "candidate work {} does not exceed local work {}",
            remote_work, local_work
        )));
    }

    let mut rebuilt = Blockchain::from_blocks(remote_blocks, guard.start_difficulty())
        .map_err(|e| ChainError::ChainRejected(e.to_string()))?;

    let adopted_hashes: HashSet<String> = rebuilt
        .confirmed_transactions()
        .map(|tx| tx.transaction_data_hash.clone())
        .collect();

    // Orphaned transactions: everything we held as pending, plus anything
    // our old chain had confirmed that the winning chain does not carry.
    let orphaned: Vec<_> = guard
        .mempool
        .pending()
        .iter()
        .chain(guard.confirmed_transactions())
        .filter(|tx| !tx.is_coinbase() && !adopted_hashes.contains(&tx.transaction_data_hash))
        .cloned()
        .collect();
    let mut temp_balances = rebuilt.balances.clone();
    for mut tx in orphaned {
        tx.mined_in_block_index = None;
        tx.transfer_successful = false;
        // Duplicates and spends the new balances cannot fund are dropped.
        if temp_balances.apply_transaction(&tx).is_ok() {
            let _ = rebuilt.mempool.add(tx);
        }
    }

    let old = std::mem::replace(&mut *guard, rebuilt);
    guard.persistence = old.persistence;
    let _ = guard.persistence.replace_chain(&guard.blocks);
    let _ = guard.persistence.save_pending(guard.mempool.pending());

    info!(
        height = guard.height(),
        work = guard.cumulative_work(),
        "adopted peer chain"
    );
    Ok(guard.height())
}
