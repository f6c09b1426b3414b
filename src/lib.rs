//! praxischain - A proof-of-work blockchain node with HTTP mining and peer sync
//!
//! # Architecture
//!
//! The crate is organized into logical modules:
//!
//! ## Core Blockchain
//! - [`blockchain`] - Blocks, chain validation and derived balances
//! - [`transaction`] - Transaction types and structural validation
//! - [`mempool`] - Pending transaction pool
//!
//! ## Consensus & Mining
//! - [`mining`] - Mining-job issuance and solved-block intake
//! - [`miner`] - Proof-of-work nonce search
//!
//! ## Cryptography
//! - [`crypto`] - Hashing, addresses and node identity
//!
//! ## State Management
//! - [`persistence`] - Database layer (SQLite)
//!
//! ## Networking
//! - [`network`] - HTTP client for peer traffic
//! - [`sync`] - Peer tracking and longest-valid-chain reconciliation
//! - [`node`] - Node orchestration
//! - [`api`] - REST API surface
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Blockchain
// ============================================================================
pub mod blockchain;
pub mod mempool;
pub mod transaction;

// ============================================================================
// Consensus & Mining
// ============================================================================
pub mod miner;
pub mod mining;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// State Management
// ============================================================================
pub mod persistence;

// ============================================================================
// Networking & Integration
// ============================================================================
pub mod api;
pub mod network;
pub mod node;
pub mod sync;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
