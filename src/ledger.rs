//! Proof-of-work ledger: blocks, the chain and fork resolution

pub mod block;
pub mod blockchain;

pub use block::{Block, BLOCK_HEADER_SIZE};
pub use blockchain::{Blockchain, MergeOutcome};
