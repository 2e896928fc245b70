//! Proof of Work search
//!
//! A hash is validly mined when its hex form starts with `difficulty` zero characters.

use crate::crypto::hash::sha256_hex_concat;
use std::sync::atomic::{AtomicBool, Ordering};

/// Attempts between two checks of the stop flag
const STOP_CHECK_INTERVAL: u32 = 4096;

/// Default number of leading hex zeros
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Check if hash meets difficulty requirement
pub fn meets_difficulty(hash: &str, difficulty: usize) -> bool {
    hash.len() >= difficulty && hash.bytes().take(difficulty).all(|b| b == b'0')
}

/// Hash the three block fields the way blocks are identified
pub fn block_digest(previous_hash: &str, data: &[u8], nonce: u32) -> String {
    sha256_hex_concat(&[previous_hash.as_bytes(), data, nonce.to_string().as_bytes()])
}

/// Search nonces upward from `start_nonce` until the digest meets `difficulty`.
///
/// Returns the winning nonce and its hash, or `None` once `should_stop` is raised
/// (checked every few thousand attempts) or the nonce space is exhausted.
pub fn search_nonce(
    previous_hash: &str,
    data: &[u8],
    start_nonce: u32,
    difficulty: usize,
    should_stop: &AtomicBool,
) -> Option<(u32, String)> {
    let mut nonce = start_nonce;
    loop {
        let hash = block_digest(previous_hash, data, nonce);
        if meets_difficulty(&hash, difficulty) {
            return Some((nonce, hash));
        }

        nonce = nonce.checked_add(1)?;

        if nonce % STOP_CHECK_INTERVAL == 0 && should_stop.load(Ordering::Relaxed) {
            return None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::zero_hash;

    #[test]
    fn test_difficulty_check() {
        assert!(meets_difficulty("00abc", 2));
        assert!(!meets_difficulty("0abc", 2));
        assert!(meets_difficulty("000abc", 3));
        assert!(meets_difficulty("abc", 0));
        assert!(!meets_difficulty("0", 2));
    }

    #[test]
    fn test_search_finds_valid_nonce() {
        let stop = AtomicBool::new(false);
        let (nonce, hash) = search_nonce(&zero_hash(), b"test", 0, 2, &stop).unwrap();
        assert!(meets_difficulty(&hash, 2));
        assert_eq!(block_digest(&zero_hash(), b"test", nonce), hash);
    }

    #[test]
    fn test_search_honors_stop_flag() {
        let stop = AtomicBool::new(true);
        // 64 leading zeros is unreachable, so only the flag can end the search
        assert!(search_nonce(&zero_hash(), b"x", 0, 64, &stop).is_none());
    }
}
