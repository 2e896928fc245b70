//! Error types for the Chainmesh library

use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for Chainmesh operations
pub type Result<T> = std::result::Result<T, ChainmeshError>;

/// Main error type for Chainmesh operations
#[derive(Error, Debug)]
pub enum ChainmeshError {
    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    /// Cryptographic errors
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    /// Ledger errors
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Tracker and peer discovery errors
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with message
    #[error("{0}")]
    Generic(String),
}

/// Network-specific error types
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The remote end closed the stream before a new frame started
    #[error("Connection closed by the remote end")]
    ConnectionClosed,

    /// The stream ended in the middle of a frame header
    #[error("Incomplete header: received {received} of {expected} bytes")]
    MalformedHeader { received: usize, expected: usize },

    /// Truncated or otherwise undecodable frame
    #[error("Malformed message: {reason}")]
    MalformedMessage { reason: String },

    /// A frame carried a tag the receiver does not handle
    #[error("Protocol violation: unexpected message tag {tag:?}")]
    ProtocolViolation { tag: char },

    /// Message too large
    #[error("Message size {size} exceeds maximum {max_size}")]
    MessageTooLarge { size: u64, max_size: u64 },

    /// Failed to bind to socket
    #[error("Failed to bind to {addr}: {source}")]
    BindFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to peer
    #[error("Failed to connect to {addr}: {source}")]
    ConnectionFailed {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Timeout occurred
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Operation requires a running service
    #[error("Service is not running")]
    NotRunning,
}

/// Cryptographic error types
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Invalid signature
    #[error("Invalid signature")]
    InvalidSignature,

    /// Invalid public key
    #[error("Invalid public key: {reason}")]
    InvalidPublicKey { reason: String },

    /// Invalid private key
    #[error("Invalid private key: {reason}")]
    InvalidPrivateKey { reason: String },
}

/// Ledger error types
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Block does not extend the current tip
    #[error("Block {hash} is not attachable to the current tip")]
    UnattachableBlock { hash: String },

    /// A transferred chain failed decoding or admission
    #[error("Invalid encoded chain at block {index}: {reason}")]
    InvalidEncodedChain { index: usize, reason: String },

    /// A single block record could not be decoded
    #[error("Invalid block encoding: {reason}")]
    InvalidBlock { reason: String },

    /// Every u32 nonce was tried without meeting the difficulty
    #[error("Nonce space exhausted at difficulty {difficulty}")]
    NonceExhausted { difficulty: usize },
}

/// Tracker and peer discovery error types
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Message from a connection the registry never saw
    #[error("Unknown connection {id}")]
    UnknownConnection { id: String },

    /// A second registration on the same connection
    #[error("Connection {id} is already registered")]
    AlreadyRegistered { id: String },

    /// Heartbeat before registration
    #[error("Connection {id} has not registered")]
    NotRegistered { id: String },

    /// Payload with the wrong size or shape for its tag
    #[error("Invalid {tag} payload: {reason}")]
    InvalidPayload { tag: char, reason: String },
}

impl ChainmeshError {
    /// Create a configuration error
    pub fn config<T: Into<String>>(msg: T) -> Self {
        ChainmeshError::Config(msg.into())
    }

    /// Create a generic error
    pub fn generic<T: Into<String>>(msg: T) -> Self {
        ChainmeshError::Generic(msg.into())
    }

    /// Create a malformed message error
    pub fn malformed<T: Into<String>>(reason: T) -> Self {
        ChainmeshError::Network(NetworkError::MalformedMessage {
            reason: reason.into(),
        })
    }

    /// True when the error means the underlying stream is no longer usable
    pub fn is_connection_fatal(&self) -> bool {
        matches!(
            self,
            ChainmeshError::Io(_)
                | ChainmeshError::Network(
                    NetworkError::ConnectionClosed
                        | NetworkError::MalformedHeader { .. }
                        | NetworkError::MalformedMessage { .. }
                        | NetworkError::MessageTooLarge { .. }
                )
        )
    }
}

impl From<serde_json::Error> for ChainmeshError {
    fn from(err: serde_json::Error) -> Self {
        ChainmeshError::Config(err.to_string())
    }
}
