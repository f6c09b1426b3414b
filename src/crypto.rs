//! Hashing and address helpers
//!
//! All hashes in the system are lowercase hex SHA-256 digests carried as
//! strings on the wire. Addresses are 40-hex-digit strings; the all-zero
//! address is reserved as the coinbase (mining reward) sender.

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};

/// A 40-hex-digit account address.
pub type Address = String;

/// Reserved sender address for mining-reward (coinbase) transactions.
/// It is not a spendable account; debits never apply to it.
pub const COINBASE_ADDRESS: &str = "0000000000000000000000000000000000000000";

/// The previous-block hash of the genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// SHA-256 of `data`, rendered as a 64-char lowercase hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Check the 40-hex-digit address format. The coinbase sentinel is a valid
/// address by this definition.
pub fn is_valid_address(addr: &str) -> bool {
    addr.len() == 40 && addr.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Check the 64-hex-digit hash format.
pub fn is_valid_hash(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Current UTC time as an RFC 3339 string with millisecond precision,
/// e.g. `2024-05-01T12:34:56.789Z`. RFC 3339 strings sort chronologically.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Random 40-hex-digit identifier for a node instance.
pub fn random_node_id() -> String {
    let bytes: [u8; 20] = rand::thread_rng().gen();
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn address_format() {
        assert!(is_valid_address(COINBASE_ADDRESS));
        assert!(is_valid_address("a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2"));
        assert!(!is_valid_address("alice"));
        assert!(!is_valid_address(ZERO_HASH));
        assert!(!is_valid_address("g1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2"));
    }

    #[test]
    fn hash_format() {
        assert!(is_valid_hash(ZERO_HASH));
        assert!(!is_valid_hash(COINBASE_ADDRESS));
    }

    #[test]
    fn node_ids_are_addresses() {
        let id = random_node_id();
        assert!(is_valid_address(&id));
        assert_ne!(id, random_node_id());
    }
}
