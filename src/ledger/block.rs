//! Block definition and its binary record format

use crate::crypto::hash::{zero_hash, HASH_HEX_LEN};
use crate::crypto::pow::{block_digest, meets_difficulty, search_nonce};
use crate::error::{LedgerError, Result};
use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::AtomicBool;

/// Fixed-width part of a block record: hash, nonce, payload length
pub const BLOCK_HEADER_SIZE: usize = HASH_HEX_LEN + 4 + 4;

/// A block of the chain, pointing to its parent by hash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub previous_hash: String,
    pub data: Vec<u8>,
    pub nonce: u32,
}

impl Block {
    /// Unmined block with a genesis parent and nonce zero
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            previous_hash: zero_hash(),
            data: data.into(),
            nonce: 0,
        }
    }

    pub fn with_parent(previous_hash: impl Into<String>, data: impl Into<Vec<u8>>, nonce: u32) -> Self {
        Self {
            previous_hash: previous_hash.into(),
            data: data.into(),
            nonce,
        }
    }

    /// SHA-256 over `previous_hash || data || nonce`, hex encoded
    pub fn hash(&self) -> String {
        block_digest(&self.previous_hash, &self.data, self.nonce)
    }

    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        meets_difficulty(&self.hash(), difficulty)
    }

    /// Search nonces from the current one until the hash meets `difficulty`.
    ///
    /// Returns `None` if `should_stop` is raised before a nonce is found.
    pub fn solve(mut self, difficulty: usize, should_stop: &AtomicBool) -> Option<Block> {
        let (nonce, _) =
            search_nonce(&self.previous_hash, &self.data, self.nonce, difficulty, should_stop)?;
        self.nonce = nonce;
        Some(self)
    }

    /// Serialize as `previous_hash:64 || nonce:u32 BE || len:u32 BE || data`
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    pub(crate) fn encode_into(&self, buf: &mut BytesMut) {
        buf.put_slice(self.previous_hash.as_bytes());
        buf.put_u32(self.nonce);
        buf.put_u32(self.data.len() as u32);
        buf.put_slice(&self.data);
    }

    pub fn encoded_len(&self) -> usize {
        BLOCK_HEADER_SIZE + self.data.len()
    }

    /// Decode a single record that must span the whole buffer
    pub fn decode(bytes: &[u8]) -> Result<Block> {
        let (block, rest) = Self::decode_prefix(bytes)?;
        if !rest.is_empty() {
            return Err(LedgerError::InvalidBlock {
                reason: format!("{} trailing bytes after block record", rest.len()),
            }
            .into());
        }
        Ok(block)
    }

    /// Decode one record from the front of `bytes`, returning the unconsumed rest
    pub fn decode_prefix(bytes: &[u8]) -> Result<(Block, &[u8])> {
        if bytes.len() < BLOCK_HEADER_SIZE {
            return Err(LedgerError::InvalidBlock {
                reason: format!("record header needs {BLOCK_HEADER_SIZE} bytes, got {}", bytes.len()),
            }
            .into());
        }

        let previous_hash = std::str::from_utf8(&bytes[..HASH_HEX_LEN])
            .ok()
            .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| LedgerError::InvalidBlock {
                reason: "previous hash is not hex".to_string(),
            })?
            .to_string();

        let mut header = &bytes[HASH_HEX_LEN..BLOCK_HEADER_SIZE];
        let nonce = header.get_u32();
        let len = header.get_u32() as usize;

        let body = &bytes[BLOCK_HEADER_SIZE..];
        if body.len() < len {
            return Err(LedgerError::InvalidBlock {
                reason: format!("record declares {len} payload bytes, {} available", body.len()),
            }
            .into());
        }

        let block = Block {
            previous_hash,
            data: body[..len].to_vec(),
            nonce,
        };
        Ok((block, &body[len..]))
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block {} (previous {}, nonce {}, {} bytes)",
            self.hash(),
            self.previous_hash,
            self.nonce,
            self.data.len()
        )
    }
}
