//! Proof-of-work search.
//!
//! A miner never sees block content, only the `blockDataHash` of a job. The
//! search grinds nonces over `"{blockDataHash}|{dateCreated}|{nonce}"` until
//! the resulting hash carries enough leading zero hex digits.

use crate::blockchain::leading_zero_digits;
use crate::crypto::sha256_hex;

/// Grind nonces starting from 0. Returns `(nonce, block_hash)` for the
/// first hash meeting `difficulty`, or `None` once `max_attempts` nonces
/// have been tried.
pub fn search_nonce(
    block_data_hash: &str,
    date_created: &str,
    difficulty: u32,
    max_attempts: u64,
) -> Option<(u64, String)> {
    let prefix = format!("{}|{}|", block_data_hash, date_created);
    let mut nonce: u64 = 0;
    loop {
        let hash = sha256_hex(format!("{}{}", prefix, nonce).as_bytes());
        if leading_zero_digits(&hash) >= difficulty {
            return Some((nonce, hash));
        }
        if nonce >= max_attempts {
            return None;
        }
        nonce += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_zero_accepts_the_first_nonce() {
        let (nonce, hash) = search_nonce(&"a".repeat(64), "2024-01-01T00:00:00.000Z", 0, 10)
            .expect("difficulty 0 always solves");
        assert_eq!(nonce, 0);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn solution_meets_the_requested_difficulty() {
        let (_, hash) = search_nonce(&"b".repeat(64), "2024-01-01T00:00:00.000Z", 2, u64::MAX)
            .expect("difficulty 2 solves quickly");
        assert!(hash.starts_with("00"));
    }

    #[test]
    fn search_gives_up_after_max_attempts() {
        // Leading 7 zero digits within 10 nonces is effectively impossible.
        assert!(search_nonce(&"c".repeat(64), "2024-01-01T00:00:00.000Z", 7, 10).is_none());
    }
}
