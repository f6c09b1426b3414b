//! HTTP client for peer-to-peer traffic.
//!
//! Peers speak the same REST surface this node serves, so the client is a
//! thin reqwest wrapper over `/info`, `/blocks` and `/peers/notify-new-block`
//! with a hard per-request timeout.

use crate::blockchain::Block;
use crate::error::ChainError;
use crate::node::NodeInfo;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Broadcast to known peers whenever the local head advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlockNotice {
    pub blocks_count: u64,
    pub cumulative_work: u64,
    pub node_url: String,
}

#[derive(Clone)]
pub struct PeerClient {
    client: reqwest::Client,
}

impl PeerClient {
    pub fn new() -> Result<Self, ChainError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ChainError::NetworkError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(PeerClient { client })
    }

    pub async fn fetch_info(&self, peer_url: &str) -> Result<NodeInfo, ChainError> {
        self.client
            .get(format!("{}/info", peer_url))
            .send()
            .await
            .map_err(|e| ChainError::NetworkError(format!("GET {}/info failed: {}", peer_url, e)))?
            .json::<NodeInfo>()
            .await
            .map_err(|e| {
                ChainError::NetworkError(format!("invalid /info response from {}: {}", peer_url, e))
            })
    }

    pub async fn fetch_blocks(&self, peer_url: &str) -> Result<Vec<Block>, ChainError> {
        self.client
            .get(format!("{}/blocks", peer_url))
            .send()
            .await
            .map_err(|e| {
                ChainError::NetworkError(format!("GET {}/blocks failed: {}", peer_url, e))
            })?
            .json::<Vec<Block>>()
            .await
            .map_err(|e| {
                ChainError::NetworkError(format!(
                    "invalid /blocks response from {}: {}",
                    peer_url, e
                ))
            })
    }

    pub async fn notify_new_block(
        &self,
        peer_url: &str,
        notice: &NewBlockNotice,
    ) -> Result<(), ChainError> {
        let response = self
            .client
            .post(format!("{}/peers/notify-new-block", peer_url))
            .json(notice)
            .send()
            .await
            .map_err(|e| {
                ChainError::NetworkError(format!(
                    "POST {}/peers/notify-new-block failed: {}",
                    peer_url, e
                ))
            })?;

        if !response.status().is_success() {
            return Err(ChainError::NetworkError(format!(
                "peer {} rejected block notice: {}",
                peer_url,
                response.status()
            )));
        }
        Ok(())
    }

    /// Ask a peer to register us back, making the connection bidirectional.
    pub async fn request_peer_connection(
        &self,
        peer_url: &str,
        own_url: &str,
    ) -> Result<(), ChainError> {
        let body = serde_json::json!({ "peerUrl": own_url });
        self.client
            .post(format!("{}/peers/add", peer_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ChainError::NetworkError(format!("POST {}/peers/add failed: {}", peer_url, e))
            })?;
        Ok(())
    }
}
