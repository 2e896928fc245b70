//! Hash utilities and functions

use sha2::{Digest, Sha256};

/// Length of a hex-encoded SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

/// Compute SHA-256 hash
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute SHA-256 hash and return as hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Hash multiple pieces of data as if they were concatenated, returning hex
pub fn sha256_hex_concat(data_pieces: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    for piece in data_pieces {
        hasher.update(piece);
    }
    hex::encode(hasher.finalize())
}

/// The all-zero digest used as the parent of a genesis block
pub fn zero_hash() -> String {
    "0".repeat(HASH_HEX_LEN)
}
