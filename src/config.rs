//! Configuration management for praxischain

use crate::error::ChainError;
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mining: MiningConfig,
}

#[derive(Debug, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
    #[serde(default = "default_network_id")]
    pub network_id: String,
    #[serde(default)]
    pub bootstrap_peers: Vec<String>,
    /// Seconds between background reconciliation passes over known peers.
    #[serde(default = "default_sync_interval")]
    pub sync_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_data_path")]
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct MiningConfig {
    #[serde(default = "default_start_difficulty")]
    pub start_difficulty: u32,
    /// Pool transactions included per mining job, oldest first.
    #[serde(default = "default_pending_tx_limit")]
    pub pending_tx_limit: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
            network_id: default_network_id(),
            bootstrap_peers: Vec::new(),
            sync_interval_secs: default_sync_interval(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_data_path() }
    }
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            start_difficulty: default_start_difficulty(),
            pending_tx_limit: default_pending_tx_limit(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            database: DatabaseConfig::default(),
            mining: MiningConfig::default(),
        }
    }
}

impl Config {
    /// Address the HTTP listener binds to.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.network.host, self.network.http_port)
    }

    /// URL this node advertises to peers.
    pub fn node_url(&self) -> String {
        format!("http://{}:{}", self.network.host, self.network.http_port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    5555
}

fn default_network_id() -> String {
    "devnet".to_string()
}

fn default_sync_interval() -> u64 {
    30
}

fn default_data_path() -> String {
    "praxischain.db".to_string()
}

fn default_start_difficulty() -> u32 {
    4
}

fn default_pending_tx_limit() -> usize {
    100
}

/// Load configuration from a TOML file; a missing file yields the defaults.
pub fn load_config(path: &str) -> Result<Config, ChainError> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)
            .map_err(|e| ChainError::ConfigError(format!("Failed to parse {}: {}", path, e)))?
    };

    if config.database.path.is_empty() {
        return Err(ChainError::ConfigError(
            "database.path must not be empty".to_string(),
        ));
    }
    if config.mining.pending_tx_limit == 0 {
        return Err(ChainError::ConfigError(
            "mining.pending_tx_limit must be at least 1".to_string(),
        ));
    }

    Ok(config)
}
