//! Database persistence layer for praxischain

use crate::blockchain::Block;
use crate::error::ChainError;
use crate::transaction::Transaction;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

/// Abstraction for persistence backends. Blocks are append-only except for
/// `replace_chain`, which swaps the whole stored sequence (chain
/// reorganizations and administrative resets).
pub trait Persistence: Send + Sync {
    fn save_block(&self, block: &Block) -> Result<(), ChainError>;
    fn replace_chain(&self, blocks: &[Block]) -> Result<(), ChainError>;
    fn load_blocks(&self) -> Result<Vec<Block>, ChainError>;
    fn save_pending(&self, pending: &[Transaction]) -> Result<(), ChainError>;
    fn load_pending(&self) -> Result<Vec<Transaction>, ChainError>;
    fn save_peers(&self, peers: &[String]) -> Result<(), ChainError>;
    fn load_peers(&self) -> Result<Vec<String>, ChainError>;
    fn save_identity(&self, node_id: &str) -> Result<(), ChainError>;
    fn load_identity(&self) -> Result<Option<String>, ChainError>;
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &str) -> Result<Self, ChainError> {
        let conn = Connection::open(path)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to open database: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                block_index INTEGER PRIMARY KEY,
                block_hash TEXT NOT NULL,
                block_json TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to create blocks table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS pending_transactions (
                transaction_data_hash TEXT PRIMARY KEY,
                position INTEGER NOT NULL,
                transaction_json TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            ChainError::DatabaseError(format!("Failed to create pending table: {}", e))
        })?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS peers (
                url TEXT PRIMARY KEY
            )",
            [],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to create peers table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            ChainError::DatabaseError(format!("Failed to create metadata table: {}", e))
        })?;

        Ok(Database { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ChainError> {
        self.conn
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }
}

impl Persistence for Database {
    fn save_block(&self, block: &Block) -> Result<(), ChainError> {
        let block_json = serde_json::to_string(block)
            .map_err(|e| ChainError::DatabaseError(format!("Failed to serialize block: {}", e)))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO blocks (block_index, block_hash, block_json)
             VALUES (?1, ?2, ?3)",
            params![block.index as i64, block.block_hash, block_json],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to save block: {}", e)))?;

        Ok(())
    }

    fn replace_chain(&self, blocks: &[Block]) -> Result<(), ChainError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(|e| {
            ChainError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute("DELETE FROM blocks", [])
            .map_err(|e| ChainError::DatabaseError(format!("Failed to clear blocks: {}", e)))?;

        for block in blocks {
            let block_json = serde_json::to_string(block).map_err(|e| {
                ChainError::DatabaseError(format!("Failed to serialize block: {}", e))
            })?;
            tx.execute(
                "INSERT INTO blocks (block_index, block_hash, block_json) VALUES (?1, ?2, ?3)",
                params![block.index as i64, block.block_hash, block_json],
            )
            .map_err(|e| ChainError::DatabaseError(format!("Failed to save block: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to commit transaction: {}", e)))
    }

    fn load_blocks(&self) -> Result<Vec<Block>, ChainError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT block_json FROM blocks ORDER BY block_index ASC")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let block_json: String = row.get(0)?;
                Ok(block_json)
            })
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query blocks: {}", e)))?;

        let mut blocks = Vec::new();
        for row in rows {
            let block_json =
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?;
            let block: Block = serde_json::from_str(&block_json).map_err(|e| {
                ChainError::DatabaseError(format!("Failed to deserialize block: {}", e))
            })?;
            blocks.push(block);
        }
        Ok(blocks)
    }

    fn save_pending(&self, pending: &[Transaction]) -> Result<(), ChainError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(|e| {
            ChainError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute("DELETE FROM pending_transactions", [])
            .map_err(|e| ChainError::DatabaseError(format!("Failed to clear pending: {}", e)))?;

        for (position, transaction) in pending.iter().enumerate() {
            let transaction_json = serde_json::to_string(transaction).map_err(|e| {
                ChainError::DatabaseError(format!("Failed to serialize transaction: {}", e))
            })?;
            tx.execute(
                "INSERT INTO pending_transactions (transaction_data_hash, position, transaction_json)
                 VALUES (?1, ?2, ?3)",
                params![
                    transaction.transaction_data_hash,
                    position as i64,
                    transaction_json
                ],
            )
            .map_err(|e| {
                ChainError::DatabaseError(format!("Failed to save transaction: {}", e))
            })?;
        }

        tx.commit()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to commit transaction: {}", e)))
    }

    fn load_pending(&self) -> Result<Vec<Transaction>, ChainError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT transaction_json FROM pending_transactions ORDER BY position ASC")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| {
                let transaction_json: String = row.get(0)?;
                Ok(transaction_json)
            })
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query pending: {}", e)))?;

        let mut pending = Vec::new();
        for row in rows {
            let transaction_json =
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?;
            let transaction: Transaction =
                serde_json::from_str(&transaction_json).map_err(|e| {
                    ChainError::DatabaseError(format!("Failed to deserialize transaction: {}", e))
                })?;
            pending.push(transaction);
        }
        Ok(pending)
    }

    fn save_peers(&self, peers: &[String]) -> Result<(), ChainError> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction().map_err(|e| {
            ChainError::DatabaseError(format!("Failed to start transaction: {}", e))
        })?;

        tx.execute("DELETE FROM peers", [])
            .map_err(|e| ChainError::DatabaseError(format!("Failed to clear peers: {}", e)))?;
        for url in peers {
            tx.execute("INSERT OR IGNORE INTO peers (url) VALUES (?1)", params![url])
                .map_err(|e| ChainError::DatabaseError(format!("Failed to save peer: {}", e)))?;
        }

        tx.commit()
            .map_err(|e| ChainError::DatabaseError(format!("Failed to commit transaction: {}", e)))
    }

    fn load_peers(&self) -> Result<Vec<String>, ChainError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT url FROM peers")
            .map_err(|e| ChainError::DatabaseError(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| ChainError::DatabaseError(format!("Failed to query peers: {}", e)))?;

        let mut peers = Vec::new();
        for row in rows {
            peers.push(
                row.map_err(|e| ChainError::DatabaseError(format!("Failed to read row: {}", e)))?,
            );
        }
        Ok(peers)
    }

    fn save_identity(&self, node_id: &str) -> Result<(), ChainError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES ('node_id', ?1)",
            params![node_id],
        )
        .map_err(|e| ChainError::DatabaseError(format!("Failed to save identity: {}", e)))?;
        Ok(())
    }

    fn load_identity(&self) -> Result<Option<String>, ChainError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM metadata WHERE key = 'node_id'",
            [],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ChainError::DatabaseError(format!("Failed to load identity: {}", e)))
    }
}

/// Volatile backend for tests and cloned chains.
#[derive(Default)]
pub struct InMemoryPersistence {
    blocks: Mutex<Vec<Block>>,
    pending: Mutex<Vec<Transaction>>,
    peers: Mutex<Vec<String>>,
    identity: Mutex<Option<String>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_block(&self, block: &Block) -> Result<(), ChainError> {
        let mut blocks = self
            .blocks
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        blocks.retain(|b| b.index != block.index);
        blocks.push(block.clone());
        blocks.sort_by_key(|b| b.index);
        Ok(())
    }

    fn replace_chain(&self, new_blocks: &[Block]) -> Result<(), ChainError> {
        let mut blocks = self
            .blocks
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        *blocks = new_blocks.to_vec();
        Ok(())
    }

    fn load_blocks(&self) -> Result<Vec<Block>, ChainError> {
        self.blocks
            .lock()
            .map(|b| b.clone())
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }

    fn save_pending(&self, new_pending: &[Transaction]) -> Result<(), ChainError> {
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        *pending = new_pending.to_vec();
        Ok(())
    }

    fn load_pending(&self) -> Result<Vec<Transaction>, ChainError> {
        self.pending
            .lock()
            .map(|p| p.clone())
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }

    fn save_peers(&self, new_peers: &[String]) -> Result<(), ChainError> {
        let mut peers = self
            .peers
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        *peers = new_peers.to_vec();
        Ok(())
    }

    fn load_peers(&self) -> Result<Vec<String>, ChainError> {
        self.peers
            .lock()
            .map(|p| p.clone())
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }

    fn save_identity(&self, node_id: &str) -> Result<(), ChainError> {
        let mut identity = self
            .identity
            .lock()
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))?;
        *identity = Some(node_id.to_string());
        Ok(())
    }

    fn load_identity(&self) -> Result<Option<String>, ChainError> {
        self.identity
            .lock()
            .map(|i| i.clone())
            .map_err(|_| ChainError::DatabaseError("Mutex poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::genesis_block;
    use crate::crypto::timestamp_now;
    use tempfile::TempDir;

    fn sample_transaction() -> Transaction {
        Transaction::new(
            "a".repeat(40),
            "b".repeat(40),
            100,
            10,
            timestamp_now(),
            None,
            None,
            None,
        )
    }

    #[test]
    fn blocks_round_trip_through_sqlite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        let block = genesis_block().clone();
        db.save_block(&block).unwrap();

        let loaded = db.load_blocks().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].block_hash, block.block_hash);
        assert_eq!(loaded[0].block_data_hash, block.block_data_hash);
    }

    #[test]
    fn replace_chain_overwrites_previous_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        db.save_block(genesis_block()).unwrap();
        db.replace_chain(&[]).unwrap();
        assert!(db.load_blocks().unwrap().is_empty());
    }

    #[test]
    fn pending_preserves_arrival_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        let first = sample_transaction();
        let second = Transaction::new(
            "c".repeat(40),
            "d".repeat(40),
            5,
            1,
            timestamp_now(),
            None,
            None,
            None,
        );
        db.save_pending(&[first.clone(), second.clone()]).unwrap();

        let loaded = db.load_pending().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].transaction_data_hash, first.transaction_data_hash);
        assert_eq!(loaded[1].transaction_data_hash, second.transaction_data_hash);
    }

    #[test]
    fn identity_and_peers_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("chain.db");
        let db = Database::open(path.to_str().unwrap()).unwrap();

        assert!(db.load_identity().unwrap().is_none());
        db.save_identity("deadbeef").unwrap();
        assert_eq!(db.load_identity().unwrap().as_deref(), Some("deadbeef"));

        db.save_peers(&["http://127.0.0.1:5556".to_string()]).unwrap();
        assert_eq!(db.load_peers().unwrap(), vec!["http://127.0.0.1:5556"]);
    }
}
