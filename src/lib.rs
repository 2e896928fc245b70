//! Chainmesh - a peer-to-peer proof-of-work ledger with tracker-based discovery
//!
//! Nodes mine signed application payloads into a hash-linked chain, gossip new blocks over
//! length-prefixed TCP frames and reconcile diverging histories with a longest-chain rule.
//! A tracker introduces nodes to each other and ranks them by chain length.

// Modules
pub mod crypto;
pub mod discovery;
pub mod error;
pub mod ledger;
pub mod message;
pub mod network;
pub mod node;

// Re-exports
pub use crypto::{DefaultVerifier, KeyPair, KeyType, SignatureVerifier, Signer};
pub use discovery::{query_top_nodes, DiscoveryConfig, P2PClient, Tracker};
pub use error::{ChainmeshError, Result};
pub use ledger::{Block, Blockchain, MergeOutcome};
pub use message::{Message, MessageType};
pub use network::{ConnectionKind, PeerId, PeerInfo};
pub use node::{Node, NodeBuilder, NodeConfig, SignedSubmission};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default port for the peer-to-peer listener
pub const DEFAULT_P2P_PORT: u16 = 9000;

/// Default port for the application listener
pub const DEFAULT_APP_PORT: u16 = 5000;

/// Default tracker port
pub use discovery::DEFAULT_TRACKER_PORT;
