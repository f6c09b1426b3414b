//! REST API surface of the node.
//!
//! Every endpoint a peer or a miner talks to lives here; `Node` owns the
//! state behind it. Error payloads are `{"errorMsg": "..."}` with the status
//! code derived from the failure class.

use axum::{
    extract::{Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::Block;
use crate::error::ChainError;
use crate::mining::MinedBlockPayload;
use crate::network::NewBlockNotice;
use crate::node::Node;
use crate::transaction::TransactionPayload;

pub enum ApiError {
    ChainError(ChainError),
    InvalidInput(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ChainError(e) => {
                let status = match &e {
                    ChainError::NotFound(_) => StatusCode::NOT_FOUND,
                    ChainError::StaleJob(_) | ChainError::DuplicatePeer(_) => StatusCode::CONFLICT,
                    ChainError::MalformedTransaction(_)
                    | ChainError::InvalidTransaction(_)
                    | ChainError::DuplicateTransaction(_)
                    | ChainError::InvalidLinkage(_)
                    | ChainError::InvalidProofOfWork(_)
                    | ChainError::InvalidDataHash(_)
                    | ChainError::ChainRejected(_) => StatusCode::BAD_REQUEST,
                    ChainError::DatabaseError(_)
                    | ChainError::NetworkError(_)
                    | ChainError::ConfigError(_)
                    | ChainError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, e.to_string())
            }
            ApiError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        (status, Json(ErrorResponse { error_msg: message })).into_response()
    }
}

impl From<ChainError> for ApiError {
    fn from(err: ChainError) -> Self {
        ApiError::ChainError(err)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_msg: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionResponse {
    pub transaction_data_hash: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBalanceResponse {
    pub address: String,
    pub confirmed_balance: u64,
    /// Confirmed balance with the pool applied on top: pending incoming
    /// added, pending outgoing (value + fee) subtracted.
    pub pending_balance: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerResponse {
    pub url: String,
    pub node_id: String,
    pub height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPeerRequest {
    pub peer_url: String,
}

// ============================================================================
// Handlers
// ============================================================================

async fn get_info(State(node): State<Node>) -> impl IntoResponse {
    Json(node.info().await)
}

async fn get_blocks(State(node): State<Node>) -> Json<Vec<Block>> {
    Json(node.chain.read().await.blocks.clone())
}

async fn get_block_by_index(
    State(node): State<Node>,
    Path(index): Path<u64>,
) -> Result<Json<Block>, ApiError> {
    let chain = node.chain.read().await;
    chain
        .block_by_index(index)
        .cloned()
        .map(Json)
        .ok_or_else(|| ChainError::NotFound(format!("no block at index {}", index)).into())
}

async fn get_pending_transactions(State(node): State<Node>) -> impl IntoResponse {
    Json(node.chain.read().await.mempool.pending().to_vec())
}

async fn get_confirmed_transactions(State(node): State<Node>) -> impl IntoResponse {
    let chain = node.chain.read().await;
    Json(chain.confirmed_transactions().cloned().collect::<Vec<_>>())
}

async fn get_transaction_by_hash(
    State(node): State<Node>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let chain = node.chain.read().await;
    chain
        .transaction_by_hash(&hash)
        .map(|tx| Json(tx.clone()).into_response())
        .ok_or_else(|| ChainError::NotFound(format!("no transaction with hash {}", hash)).into())
}

async fn get_all_balances(State(node): State<Node>) -> impl IntoResponse {
    Json(node.chain.read().await.balances.all().clone())
}

async fn get_address_transactions(
    State(node): State<Node>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    Json(node.chain.read().await.transactions_by_address(&address))
}

async fn get_address_balance(
    State(node): State<Node>,
    Path(address): Path<String>,
) -> Json<AddressBalanceResponse> {
    let chain = node.chain.read().await;
    let confirmed = chain.balance_of(&address);

    let mut pending = confirmed;
    for tx in chain.mempool.pending() {
        if tx.to == address {
            pending = pending.saturating_add(tx.value);
        }
        if tx.from == address {
            pending = pending.saturating_sub(tx.value.saturating_add(tx.fee));
        }
    }

    Json(AddressBalanceResponse {
        address,
        confirmed_balance: confirmed,
        pending_balance: pending,
    })
}

async fn send_transaction(
    State(node): State<Node>,
    Json(payload): Json<TransactionPayload>,
) -> Result<(StatusCode, Json<SendTransactionResponse>), ApiError> {
    let mut chain = node.chain.write().await;
    let transaction_data_hash = chain.add_new_transaction(payload)?;
    Ok((
        StatusCode::CREATED,
        Json(SendTransactionResponse { transaction_data_hash }),
    ))
}

async fn get_peers(State(node): State<Node>) -> Json<Vec<PeerResponse>> {
    let peers = node
        .peers
        .peers()
        .await
        .into_iter()
        .map(|p| PeerResponse { url: p.url, node_id: p.node_id, height: p.height })
        .collect();
    Json(peers)
}

async fn add_peer(
    State(node): State<Node>,
    Json(request): Json<AddPeerRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if request.peer_url.is_empty() {
        return Err(ApiError::InvalidInput("peerUrl must not be empty".to_string()));
    }
    node.connect_peer(&request.peer_url).await?;
    Ok(Json(MessageResponse {
        message: format!("Connected to peer: {}", request.peer_url),
    }))
}

async fn notify_new_block(
    State(node): State<Node>,
    Json(notice): Json<NewBlockNotice>,
) -> Json<MessageResponse> {
    node.handle_block_notice(notice).await;
    Json(MessageResponse { message: "Thank you for the notification.".to_string() })
}

async fn get_mining_job(
    State(node): State<Node>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    let mut chain = node.chain.write().await;
    let job = chain.get_mining_job(&address, node.pending_tx_limit)?;
    Ok(Json(job).into_response())
}

async fn submit_mined_block(
    State(node): State<Node>,
    Json(payload): Json<MinedBlockPayload>,
) -> Result<Json<MessageResponse>, ApiError> {
    let (index, reward_address) = {
        let mut chain = node.chain.write().await;
        let block = chain.submit_mined_block(payload)?;
        (block.index, block.mined_by.clone())
    };

    tracing::info!(index, "mined block accepted");
    node.announce_new_block().await;

    Ok(Json(MessageResponse {
        message: format!("Block accepted, reward paid to {}", reward_address),
    }))
}

async fn reset_chain(State(node): State<Node>) -> Json<MessageResponse> {
    node.reset_chain().await;
    Json(MessageResponse {
        message: "The chain was reset to its genesis block".to_string(),
    })
}

/// Request logging middleware: method, path, status, duration.
async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

/// Build the router with all endpoints (also used by the test server).
pub fn build_api_router(node: Node) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(vec![http::Method::GET, http::Method::POST, http::Method::OPTIONS])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/info", get(get_info))
        // Chain endpoints
        .route("/blocks", get(get_blocks))
        .route("/blocks/:index", get(get_block_by_index))
        // Transaction endpoints
        .route("/transactions/pending", get(get_pending_transactions))
        .route("/transactions/confirmed", get(get_confirmed_transactions))
        .route("/transactions/:hash", get(get_transaction_by_hash))
        .route("/transaction/send", post(send_transaction))
        // Balance and address endpoints
        .route("/balances", get(get_all_balances))
        .route("/address/:address/transactions", get(get_address_transactions))
        .route("/address/:address/balance", get(get_address_balance))
        // Peer endpoints
        .route("/peers", get(get_peers))
        .route("/peers/add", post(add_peer))
        .route("/peers/notify-new-block", post(notify_new_block))
        // Mining endpoints
        .route("/mining/get-mining-job/:address", get(get_mining_job))
        .route("/mining/submit-mined-block", post(submit_mined_block))
        // Administrative recovery
        .route("/debug/reset-chain", get(reset_chain))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

pub async fn run_api_server(node: Node, bind_addr: &str) -> Result<(), ChainError> {
    let router = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|e| ChainError::NetworkError(format!("Failed to bind {}: {}", bind_addr, e)))?;

    tracing::info!(addr = bind_addr, "API server listening");
    axum::serve(listener, router)
        .await
        .map_err(|e| ChainError::NetworkError(format!("API server error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_statuses_follow_the_failure_kind() {
        let status = |e: ChainError| ApiError::ChainError(e).into_response().status();

        assert_eq!(status(ChainError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ChainError::StaleJob("x".into())), StatusCode::CONFLICT);
        assert_eq!(status(ChainError::DuplicatePeer("x".into())), StatusCode::CONFLICT);
        assert_eq!(
            status(ChainError::InvalidTransaction("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ChainError::DatabaseError("x".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
