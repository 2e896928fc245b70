//! Hash-linked chain of proof-of-work blocks with longest-chain merging

use crate::crypto::hash::sha256_hex;
use crate::crypto::pow::{meets_difficulty, DEFAULT_DIFFICULTY};
use crate::error::{ChainmeshError, LedgerError, Result};
use crate::ledger::block::Block;
use bytes::BytesMut;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicBool;
use tracing::debug;

/// Result of reconciling the local chain with a remote one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The remote chain did not win; nothing changed
    Unchanged,
    /// The local suffix after `fork_point` was replaced by the remote suffix.
    ///
    /// `fork_point` is `None` when the histories share no block and the whole local
    /// chain was replaced.
    Merged {
        fork_point: Option<usize>,
        discarded: Vec<Block>,
    },
}

impl MergeOutcome {
    /// Whether the local chain changed
    pub fn is_merged(&self) -> bool {
        matches!(self, MergeOutcome::Merged { .. })
    }

    /// First chain index whose block came from the remote chain
    pub fn replaced_from(&self) -> Option<usize> {
        match self {
            MergeOutcome::Unchanged => None,
            MergeOutcome::Merged { fork_point, .. } => Some(fork_point.map_or(0, |f| f + 1)),
        }
    }
}

/// The chain plus its hash and payload indexes
#[derive(Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
    /// block hash -> index in `chain`
    block_table: HashMap<String, usize>,
    /// payload digest -> number of blocks carrying that payload
    payload_table: HashMap<String, usize>,
    difficulty: usize,
}

impl Blockchain {
    /// Create an empty chain at the default difficulty
    pub fn new() -> Self {
        Self::with_difficulty(DEFAULT_DIFFICULTY)
    }

    /// Create an empty chain requiring `difficulty` leading zero hex digits
    pub fn with_difficulty(difficulty: usize) -> Self {
        Self {
            chain: Vec::new(),
            block_table: HashMap::new(),
            payload_table: HashMap::new(),
            difficulty,
        }
    }

    /// Leading zero hex digits required of every hash
    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Number of blocks
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Blocks in chain order
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Block at `index`
    pub fn get(&self, index: usize) -> Option<&Block> {
        self.chain.get(index)
    }

    /// Last block
    pub fn tip(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Hash of the last block
    pub fn tip_hash(&self) -> Option<String> {
        self.tip().map(Block::hash)
    }

    /// Position of the block with `hash`
    pub fn index_of(&self, hash: &str) -> Option<usize> {
        self.block_table.get(hash).copied()
    }

    /// True if a block with `hash` is on the chain
    pub fn contains_block(&self, hash: &str) -> bool {
        self.block_table.contains_key(hash)
    }

    /// True if some block on the chain already carries `data`
    pub fn contains_payload(&self, data: &[u8]) -> bool {
        self.payload_table.contains_key(&sha256_hex(data))
    }

    /// Point `block` at the current tip without searching for a nonce
    pub fn prepare(&self, mut block: Block) -> Block {
        if let Some(hash) = self.tip_hash() {
            block.previous_hash = hash;
        }
        block
    }

    /// Link `block` to the tip and search for a nonce meeting the difficulty.
    ///
    /// Does not append; the caller decides whether the result is still attachable.
    pub fn mine(&self, block: Block) -> Result<Block> {
        let never = AtomicBool::new(false);
        self.prepare(block)
            .solve(self.difficulty, &never)
            .ok_or_else(|| {
                LedgerError::NonceExhausted {
                    difficulty: self.difficulty,
                }
                .into()
            })
    }

    /// Whether `block` can be appended to the current tip
    pub fn is_attachable(&self, block: &Block) -> bool {
        let Some(tip) = self.tip() else {
            return true;
        };
        let tip_hash = tip.hash();
        block.previous_hash == tip_hash
            && meets_difficulty(&tip_hash, self.difficulty)
            && block.meets_difficulty(self.difficulty)
    }

    /// Append an attachable block
    pub fn add(&mut self, block: Block) -> Result<()> {
        if !self.is_attachable(&block) {
            return Err(LedgerError::UnattachableBlock { hash: block.hash() }.into());
        }
        self.push_indexed(block);
        Ok(())
    }

    /// Remove the tip, keeping both indexes consistent
    pub fn pop(&mut self) -> Option<Block> {
        let block = self.chain.pop()?;
        self.unindex(&block);
        Some(block)
    }

    /// Re-verify the whole chain
    pub fn is_valid(&self) -> bool {
        self.is_valid_from(1)
    }

    /// Re-verify every linked pair starting at `start`
    pub fn is_valid_from(&self, start: usize) -> bool {
        let start = start.max(1);
        if start > self.chain.len() {
            return true;
        }
        self.chain[start - 1..].windows(2).all(|pair| {
            let parent_hash = pair[0].hash();
            pair[1].previous_hash == parent_hash
                && meets_difficulty(&parent_hash, self.difficulty)
                && pair[1].meets_difficulty(self.difficulty)
        })
    }

    /// Adopt the remote history if it is strictly longer past the fork point.
    ///
    /// The remote chain is scanned from its tail toward its head; each block whose parent
    /// hash is known locally yields a candidate fork point, and the first candidate whose
    /// remote suffix outgrows the local suffix wins. Ties keep the local chain.
    pub fn merge_chain(&mut self, remote: Vec<Block>) -> MergeOutcome {
        let local_len = self.chain.len();
        let mut linked = false;

        for suffix_len in 1..=remote.len() {
            let idx = remote.len() - suffix_len;
            let Some(fork_point) = self.index_of(&remote[idx].previous_hash) else {
                continue;
            };
            linked = true;
            if suffix_len > local_len - fork_point - 1 {
                debug!(fork_point, suffix_len, local_len, "adopting remote suffix");
                return self.replace_suffix(Some(fork_point), remote, idx);
            }
        }

        if !linked && remote.len() > local_len {
            debug!(remote_len = remote.len(), local_len, "adopting disjoint remote chain");
            return self.replace_suffix(None, remote, 0);
        }

        MergeOutcome::Unchanged
    }

    fn replace_suffix(
        &mut self,
        fork_point: Option<usize>,
        remote: Vec<Block>,
        remote_start: usize,
    ) -> MergeOutcome {
        let keep = fork_point.map_or(0, |f| f + 1);
        let discarded: Vec<Block> = self.chain.drain(keep..).collect();
        for block in &discarded {
            self.unindex(block);
        }
        for block in remote.into_iter().skip(remote_start) {
            self.push_indexed(block);
        }
        MergeOutcome::Merged {
            fork_point,
            discarded,
        }
    }

    fn push_indexed(&mut self, block: Block) {
        self.block_table.insert(block.hash(), self.chain.len());
        *self.payload_table.entry(sha256_hex(&block.data)).or_insert(0) += 1;
        self.chain.push(block);
    }

    fn unindex(&mut self, block: &Block) {
        self.block_table.remove(&block.hash());
        let digest = sha256_hex(&block.data);
        if let Some(count) = self.payload_table.get_mut(&digest) {
            *count -= 1;
            if *count == 0 {
                self.payload_table.remove(&digest);
            }
        }
    }

    /// Concatenate every block record
    pub fn encode(&self) -> Vec<u8> {
        let size = self.chain.iter().map(Block::encoded_len).sum();
        let mut buf = BytesMut::with_capacity(size);
        for block in &self.chain {
            block.encode_into(&mut buf);
        }
        buf.to_vec()
    }

    /// Rebuild a chain from its encoding, admitting every block through `add`
    pub fn decode(mut bytes: &[u8], difficulty: usize) -> Result<Blockchain> {
        let mut chain = Blockchain::with_difficulty(difficulty);
        while !bytes.is_empty() {
            let index = chain.len();
            let (block, rest) = Block::decode_prefix(bytes).map_err(|e| {
                ChainmeshError::from(LedgerError::InvalidEncodedChain {
                    index,
                    reason: e.to_string(),
                })
            })?;
            chain.add(block).map_err(|e| LedgerError::InvalidEncodedChain {
                index,
                reason: e.to_string(),
            })?;
            bytes = rest;
        }
        Ok(chain)
    }

    /// Consume the chain, returning its blocks
    pub fn into_blocks(self) -> Vec<Block> {
        self.chain
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Blockchain {
    fn eq(&self, other: &Self) -> bool {
        self.difficulty == other.difficulty && self.chain == other.chain
    }
}

impl Eq for Blockchain {}

impl fmt::Debug for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blockchain")
            .field("len", &self.chain.len())
            .field("difficulty", &self.difficulty)
            .field("tip", &self.tip_hash())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIFFICULTY: usize = 2;

    fn mine_all(chain: &mut Blockchain, payloads: &[&[u8]]) {
        for data in payloads {
            let block = chain.mine(Block::new(data.to_vec())).unwrap();
            chain.add(block).unwrap();
        }
    }

    fn chain_of(payloads: &[&[u8]]) -> Blockchain {
        let mut chain = Blockchain::with_difficulty(DIFFICULTY);
        mine_all(&mut chain, payloads);
        chain
    }

    #[test]
    fn test_mined_chain_is_valid() {
        let chain = chain_of(&[b"hello", b"goodbye", b"test", b"DATA here"]);
        assert_eq!(chain.len(), 4);
        assert!(chain.is_valid());
        for (i, block) in chain.blocks().iter().enumerate() {
            assert_eq!(chain.index_of(&block.hash()), Some(i));
            assert!(chain.contains_payload(&block.data));
        }
    }

    #[test]
    fn test_tampering_invalidates_chain() {
        let mut chain = chain_of(&[b"hello", b"goodbye", b"test", b"DATA here"]);
        chain.chain[2].data = b"NEW DATA".to_vec();
        assert!(!chain.is_valid());
        // validation from a later index only sees the tail
        assert!(chain.is_valid_from(4));
    }

    #[test]
    fn test_attachability() {
        let mut chain = chain_of(&[b"hello", b"goodbye", b"test"]);
        let last = chain.pop().unwrap();
        assert!(!chain.contains_block(&last.hash()));
        assert!(!chain.contains_payload(b"test"));
        assert!(chain.is_attachable(&last));

        let mut stale = last.clone();
        stale.previous_hash = chain.get(0).unwrap().hash();
        assert!(!chain.is_attachable(&stale));
        assert!(chain.add(stale).is_err());

        chain.add(last).unwrap();
        assert!(chain.is_valid());
    }

    #[test]
    fn test_unmined_block_not_attachable() {
        let chain = chain_of(&[b"hello"]);
        let unmined = chain.prepare(Block::new(b"lazy".to_vec()));
        if !unmined.meets_difficulty(DIFFICULTY) {
            assert!(!chain.is_attachable(&unmined));
        }
    }

    #[test]
    fn test_merge_adopts_longer_fork() {
        let mut local = chain_of(&[b"hello", b"goodbye"]);
        let mut remote = local.clone();
        mine_all(&mut local, &[b"test", b"DATA here"]);
        mine_all(&mut remote, &[b"changed", b"changed DATA here", b"I'm longer"]);

        let outcome = local.merge_chain(remote.blocks().to_vec());
        match &outcome {
            MergeOutcome::Merged {
                fork_point,
                discarded,
            } => {
                assert_eq!(*fork_point, Some(1));
                let payloads: Vec<&[u8]> = discarded.iter().map(|b| b.data.as_slice()).collect();
                assert_eq!(payloads, vec![b"test".as_slice(), b"DATA here".as_slice()]);
            },
            MergeOutcome::Unchanged => panic!("longer remote chain should win"),
        }
        assert_eq!(outcome.replaced_from(), Some(2));
        assert_eq!(local, remote);
        assert!(local.is_valid());
        assert!(!local.contains_payload(b"test"));
        assert!(local.contains_payload(b"I'm longer"));
        for (i, block) in local.blocks().iter().enumerate() {
            assert_eq!(local.index_of(&block.hash()), Some(i));
        }
    }

    #[test]
    fn test_merge_keeps_local_on_tie_or_shorter() {
        let mut local = chain_of(&[b"hello", b"goodbye"]);
        let mut remote = local.clone();
        mine_all(&mut local, &[b"a", b"b"]);
        mine_all(&mut remote, &[b"x", b"y"]);
        let before = local.clone();

        assert_eq!(local.merge_chain(remote.blocks().to_vec()), MergeOutcome::Unchanged);
        assert_eq!(local, before);

        let shorter = chain_of(&[b"hello", b"goodbye", b"z"]);
        assert_eq!(local.merge_chain(shorter.into_blocks()), MergeOutcome::Unchanged);
        assert_eq!(local, before);
    }

    #[test]
    fn test_merge_extends_prefix() {
        let mut local = chain_of(&[b"hello", b"goodbye", b"test"]);
        let mut remote = local.clone();
        mine_all(&mut remote, &[b"1", b"2", b"3", b"4", b"5"]);

        let outcome = local.merge_chain(remote.blocks().to_vec());
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                fork_point: Some(2),
                discarded: vec![],
            }
        );
        assert_eq!(local.len(), 8);
        assert!(local.is_valid());
    }

    #[test]
    fn test_merge_into_empty_chain() {
        let mut local = Blockchain::with_difficulty(DIFFICULTY);
        let remote = chain_of(&[b"hello", b"goodbye"]);
        let outcome = local.merge_chain(remote.blocks().to_vec());
        assert_eq!(outcome.replaced_from(), Some(0));
        assert_eq!(local, remote);
    }

    #[test]
    fn test_encode_decode() {
        let chain = chain_of(&[b"hello", b"", b"test"]);
        let decoded = Blockchain::decode(&chain.encode(), DIFFICULTY).unwrap();
        assert_eq!(decoded, chain);
        assert!(Blockchain::decode(&[], DIFFICULTY).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_invalid_chain() {
        let chain = chain_of(&[b"hello", b"goodbye", b"test"]);
        let mut encoded = chain.encode();

        let truncated = &encoded[..encoded.len() - 2];
        assert!(matches!(
            Blockchain::decode(truncated, DIFFICULTY),
            Err(ChainmeshError::Ledger(LedgerError::InvalidEncodedChain { index: 2, .. }))
        ));

        // corrupt the second block's parent hash
        let offset = chain.get(0).unwrap().encoded_len();
        encoded[offset] = if encoded[offset] == b'a' { b'b' } else { b'a' };
        assert!(matches!(
            Blockchain::decode(&encoded, DIFFICULTY),
            Err(ChainmeshError::Ledger(LedgerError::InvalidEncodedChain { index: 1, .. }))
        ));
    }
}
