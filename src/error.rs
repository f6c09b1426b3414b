//! Error types for praxischain

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    MalformedTransaction(String),
    InvalidTransaction(String),
    DuplicateTransaction(String),
    InvalidLinkage(String),
    InvalidProofOfWork(String),
    InvalidDataHash(String),
    StaleJob(String),
    DuplicatePeer(String),
    ChainRejected(String),
    NotFound(String),
    DatabaseError(String),
    NetworkError(String),
    ConfigError(String),
    IoError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::MalformedTransaction(msg) => write!(f, "Malformed transaction: {}", msg),
            ChainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            ChainError::DuplicateTransaction(msg) => write!(f, "Duplicate transaction: {}", msg),
            ChainError::InvalidLinkage(msg) => write!(f, "Invalid block linkage: {}", msg),
            ChainError::InvalidProofOfWork(msg) => write!(f, "Invalid proof of work: {}", msg),
            ChainError::InvalidDataHash(msg) => write!(f, "Invalid data hash: {}", msg),
            ChainError::StaleJob(msg) => write!(f, "Stale mining job: {}", msg),
            ChainError::DuplicatePeer(msg) => write!(f, "Duplicate peer: {}", msg),
            ChainError::ChainRejected(msg) => write!(f, "Chain rejected: {}", msg),
            ChainError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ChainError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ChainError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            ChainError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            ChainError::IoError(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<std::io::Error> for ChainError {
    fn from(err: std::io::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::IoError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
