//! Node orchestration: identity, startup recovery, peer lifecycle and the
//! background reconciliation loop. The HTTP surface lives in `api`; this
//! module owns the shared state it serves.

use crate::blockchain::Blockchain;
use crate::config::Config;
use crate::error::ChainError;
use crate::network::{NewBlockNotice, PeerClient};
use crate::persistence::{Database, Persistence};
use crate::sync::{resolve_chain, PeerState, PeerSyncManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub const NODE_ABOUT: &str = concat!("praxischain/", env!("CARGO_PKG_VERSION"));

/// Snapshot served at `/info` and exchanged during peer handshakes. The
/// `chain_id` is the genesis block hash; peers on different networks refuse
/// each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub about: String,
    pub node_id: String,
    pub chain_id: String,
    pub node_url: String,
    pub peers: usize,
    pub current_difficulty: u32,
    pub blocks_count: u64,
    pub cumulative_work: u64,
    pub confirmed_transactions: usize,
    pub pending_transactions: usize,
}

/// One running node. Cheap to clone; all fields are shared handles.
#[derive(Clone)]
pub struct Node {
    pub chain: Arc<RwLock<Blockchain>>,
    pub peers: PeerSyncManager,
    pub client: PeerClient,
    pub node_id: String,
    pub node_url: String,
    pub pending_tx_limit: usize,
    sync_interval: Duration,
}

impl Node {
    /// Bring a node up from its database, or from genesis when the database
    /// is empty. Persisted pending transactions and peers are restored
    /// best-effort; a record that no longer validates is dropped.
    pub fn init(config: &Config) -> Result<Self, ChainError> {
        let database = Database::open(&config.database.path)?;

        let node_id = match database.load_identity()? {
            Some(id) => id,
            None => {
                let id = crate::crypto::random_node_id();
                database.save_identity(&id)?;
                id
            }
        };

        let stored_blocks = database.load_blocks()?;
        let stored_pending = database.load_pending()?;
        let persistence: Box<dyn Persistence> = Box::new(database);

        let mut chain = if stored_blocks.is_empty() {
            Blockchain::new_with_persistence(config.mining.start_difficulty, persistence)?
        } else {
            let mut chain =
                Blockchain::from_blocks(&stored_blocks, config.mining.start_difficulty)?;
            chain.persistence = persistence;
            chain
        };
        for tx in stored_pending {
            if let Err(e) = chain.mempool.add(tx) {
                debug!(error = %e, "dropping persisted pending transaction");
            }
        }

        info!(
            node_id = %node_id,
            height = chain.height(),
            pending = chain.mempool.len(),
            "node state restored"
        );

        Ok(Node {
            chain: Arc::new(RwLock::new(chain)),
            peers: PeerSyncManager::new(),
            client: PeerClient::new()?,
            node_id,
            node_url: config.node_url(),
            pending_tx_limit: config.mining.pending_tx_limit,
            sync_interval: Duration::from_secs(config.network.sync_interval_secs),
        })
    }

    pub async fn info(&self) -> NodeInfo {
        let chain = self.chain.read().await;
        NodeInfo {
            about: NODE_ABOUT.to_string(),
            node_id: self.node_id.clone(),
            chain_id: chain.chain_id().to_string(),
            node_url: self.node_url.clone(),
            peers: self.peers.peer_count().await,
            current_difficulty: chain.difficulty,
            blocks_count: chain.height() + 1,
            cumulative_work: chain.cumulative_work(),
            confirmed_transactions: chain.confirmed_transaction_count(),
            pending_transactions: chain.mempool.len(),
        }
    }

    /// Handshake with a peer: verify it runs the same network, register it,
    /// ask it to register us back, then reconcile chains once.
    pub async fn connect_peer(&self, peer_url: &str) -> Result<(), ChainError> {
        let remote = self.client.fetch_info(peer_url).await?;
        let local_chain_id = self.chain.read().await.chain_id().to_string();
        if remote.chain_id != local_chain_id {
            return Err(ChainError::NetworkError(format!(
                "peer {} runs a different network (chainId {})",
                peer_url, remote.chain_id
            )));
        }
        if remote.node_id == self.node_id {
            return Err(ChainError::NetworkError(
                "refusing to register self as a peer".to_string(),
            ));
        }

        self.peers.register_peer(peer_url, &remote.node_id).await?;
        self.peers
            .update_peer(peer_url, remote.blocks_count.saturating_sub(1), remote.cumulative_work)
            .await;

        if let Err(e) = self
            .client
            .request_peer_connection(peer_url, &self.node_url)
            .await
        {
            debug!(peer = peer_url, error = %e, "reverse registration failed");
        }

        match self.sync_with_peer(peer_url).await {
            Ok(_) | Err(ChainError::ChainRejected(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Download the peer's chain and run fork choice against it. A
    /// `ChainRejected` outcome means the local chain already wins; network
    /// failures count against the peer's reliability.
    pub async fn sync_with_peer(&self, peer_url: &str) -> Result<u64, ChainError> {
        self.peers.set_state(peer_url, PeerState::Synchronizing).await;

        let blocks = match self.client.fetch_blocks(peer_url).await {
            Ok(blocks) => blocks,
            Err(e) => {
                self.peers.mark_failure(peer_url).await;
                return Err(e);
            }
        };

        let result = resolve_chain(&self.chain, &blocks).await;
        self.peers.set_state(peer_url, PeerState::Synced).await;

        if let Ok(height) = &result {
            info!(peer = peer_url, height, "chain replaced after sync");
            self.announce_new_block().await;
        }
        result
    }

    /// A peer claims to have a heavier chain; pull and evaluate it unless
    /// our own is already at least as heavy.
    pub async fn handle_block_notice(&self, notice: NewBlockNotice) {
        let local_work = self.chain.read().await.cumulative_work();
        if notice.cumulative_work <= local_work {
            debug!(peer = %notice.node_url, "ignoring block notice with no extra work");
            return;
        }

        let node = self.clone();
        let peer_url = notice.node_url.clone();
        tokio::spawn(async move {
            if let Err(e) = node.sync_with_peer(&peer_url).await {
                debug!(peer = %peer_url, error = %e, "sync after block notice failed");
            }
        });
    }

    /// Tell every known peer the head moved. Failures are logged, never
    /// propagated; announcement is best-effort.
    pub async fn announce_new_block(&self) {
        let notice = {
            let chain = self.chain.read().await;
            NewBlockNotice {
                blocks_count: chain.height() + 1,
                cumulative_work: chain.cumulative_work(),
                node_url: self.node_url.clone(),
            }
        };

        for peer_url in self.peers.peer_urls().await {
            if let Err(e) = self.client.notify_new_block(&peer_url, &notice).await {
                warn!(peer = %peer_url, error = %e, "block announcement failed");
                self.peers.mark_failure(&peer_url).await;
            }
        }
    }

    /// Wipe everything back to genesis. Exposed only through the debug API.
    pub async fn reset_chain(&self) {
        let mut chain = self.chain.write().await;
        chain.reset();
        info!("chain reset to genesis");
    }

    /// Refresh every peer's advertised height and work from its `/info`.
    pub async fn refresh_peers(&self) {
        for peer_url in self.peers.peer_urls().await {
            match self.client.fetch_info(&peer_url).await {
                Ok(info) => {
                    self.peers
                        .update_peer(
                            &peer_url,
                            info.blocks_count.saturating_sub(1),
                            info.cumulative_work,
                        )
                        .await;
                }
                Err(e) => {
                    debug!(peer = %peer_url, error = %e, "peer info refresh failed");
                    self.peers.mark_failure(&peer_url).await;
                }
            }
        }
    }

    /// Background loop: refresh peer info, then reconcile with the peer
    /// advertising the most work. Only the heaviest advertised chain can
    /// beat the local one, so a single sync per tick suffices.
    pub async fn run_sync_loop(&self) {
        let mut ticker = tokio::time::interval(self.sync_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.refresh_peers().await;

            let Some(peer) = self.peers.best_peer().await else {
                continue;
            };
            if peer.cumulative_work <= self.chain.read().await.cumulative_work() {
                continue;
            }
            match self.sync_with_peer(&peer.url).await {
                Ok(_) | Err(ChainError::ChainRejected(_)) => {}
                Err(e) => debug!(peer = %peer.url, error = %e, "periodic sync failed"),
            }
        }
    }

    /// Connect the configured bootstrap peers, tolerating unreachable ones.
    pub async fn connect_bootstrap_peers(&self, peers: &[String]) {
        for peer_url in peers {
            if let Err(e) = self.connect_peer(peer_url).await {
                warn!(peer = %peer_url, error = %e, "bootstrap connection failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DatabaseConfig};

    fn config_with_db(path: &str) -> Config {
        Config {
            database: DatabaseConfig { path: path.to_string() },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn identity_survives_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("node.db");
        let config = config_with_db(path.to_str().unwrap());

        let first = Node::init(&config).unwrap();
        let id = first.node_id.clone();
        drop(first);

        let second = Node::init(&config).unwrap();
        assert_eq!(second.node_id, id);
    }

    #[tokio::test]
    async fn info_reflects_genesis_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("node.db");
        let node = Node::init(&config_with_db(path.to_str().unwrap())).unwrap();

        let info = node.info().await;
        assert_eq!(info.blocks_count, 1);
        assert_eq!(info.pending_transactions, 0);
        assert_eq!(info.confirmed_transactions, 0);
        assert_eq!(info.chain_id.len(), 64);
    }

    #[tokio::test]
    async fn chain_survives_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("node.db");
        let config = config_with_db(path.to_str().unwrap());

        {
            let node = Node::init(&config).unwrap();
            let mut chain = node.chain.write().await;
            chain.difficulty = 0;
            let job = chain.get_mining_job(&"a".repeat(40), 10).unwrap();
            let date = crate::crypto::timestamp_now();
            let (nonce, hash) =
                crate::miner::search_nonce(&job.block_data_hash, &date, 0, 10).unwrap();
            chain
                .submit_mined_block(crate::mining::MinedBlockPayload {
                    block_data_hash: job.block_data_hash,
                    date_created: date,
                    nonce,
                    block_hash: hash,
                })
                .unwrap();
        }

        let node = Node::init(&config).unwrap();
        assert_eq!(node.chain.read().await.height(), 1);
    }
}
