//! Tracker-based peer discovery
//!
//! Nodes register their listen port with a tracker, receive the list of peers already
//! registered, and report their chain length through heartbeats. The tracker ranks registered
//! nodes by that length for clients looking for the most up-to-date ledger.

pub mod client;
pub mod registry;
pub mod tracker;

pub use client::P2PClient;
pub use registry::{PeerRegistry, RegisteredPeer};
pub use tracker::{query_top_nodes, Tracker};

use crate::error::{DiscoveryError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::time::Duration;
use tokio::net::TcpStream;

/// Size of one `ip:4 || port:2` record in `L` and `S` payloads
pub const PEER_RECORD_SIZE: usize = 6;

/// Size of an `R` payload
pub const REGISTRATION_SIZE: usize = 2 + PEER_RECORD_SIZE;

/// Default tracker port
pub const DEFAULT_TRACKER_PORT: u16 = 8000;

/// Default heartbeat interval in milliseconds
pub const DEFAULT_HEARTBEAT_INTERVAL_MS: u64 = 1000;

/// Discovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Address the P2P listener binds to; port 0 picks a free port
    pub listen_addr: SocketAddr,
    /// Tracker to register with
    pub tracker_addr: SocketAddr,
    /// Address announced to top-k clients; defaults to the node's app listener
    pub node_addr: Option<SocketAddrV4>,
    /// How often to report the chain length
    pub heartbeat_interval_ms: u64,
    /// Re-register after losing the tracker; `None` leaves discovery stopped
    pub reconnect_interval_ms: Option<u64>,
    /// Timeout for dialing the tracker and peers
    pub connect_timeout_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            tracker_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_TRACKER_PORT)),
            node_addr: None,
            heartbeat_interval_ms: DEFAULT_HEARTBEAT_INTERVAL_MS,
            reconnect_interval_ms: None,
            connect_timeout_ms: 5000,
        }
    }
}

impl DiscoveryConfig {
    pub fn new(tracker_addr: SocketAddr) -> Self {
        Self {
            tracker_addr,
            ..Self::default()
        }
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    pub fn reconnect_interval(&self) -> Option<Duration> {
        self.reconnect_interval_ms.map(Duration::from_millis)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Owner of the connections a [`P2PClient`] discovers
#[async_trait]
pub trait DiscoveryHandler: Send + Sync {
    /// Take ownership of a freshly dialed or accepted peer connection
    async fn on_peer_joined(&self, stream: TcpStream, address: SocketAddr);

    /// Chain length reported in heartbeats
    async fn chain_length(&self) -> u32;

    /// Number of live gossip peers
    async fn peer_count(&self) -> usize;
}

/// Body of an `R` message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registration {
    /// Port the registering node accepts peers on
    pub listen_port: u16,
    /// Address handed out to top-k clients
    pub node_addr: SocketAddrV4,
}

impl Registration {
    pub fn new(listen_port: u16, node_addr: SocketAddrV4) -> Self {
        Self {
            listen_port,
            node_addr,
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(REGISTRATION_SIZE);
        buf.extend_from_slice(&self.listen_port.to_be_bytes());
        buf.extend_from_slice(&encode_peer_records(&[self.node_addr]));
        buf
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        if payload.len() != REGISTRATION_SIZE {
            return Err(invalid_payload(
                'R',
                format!("expected {REGISTRATION_SIZE} bytes, got {}", payload.len()),
            ));
        }
        let listen_port = u16::from_be_bytes([payload[0], payload[1]]);
        Ok(Self::new(listen_port, read_record(&payload[2..])))
    }
}

/// Concatenate `ip:4 || port:u16 BE` records
pub fn encode_peer_records(addrs: &[SocketAddrV4]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(addrs.len() * PEER_RECORD_SIZE);
    for addr in addrs {
        buf.extend_from_slice(&addr.ip().octets());
        buf.extend_from_slice(&addr.port().to_be_bytes());
    }
    buf
}

pub fn decode_peer_records(payload: &[u8]) -> Result<Vec<SocketAddrV4>> {
    if payload.len() % PEER_RECORD_SIZE != 0 {
        return Err(invalid_payload(
            'L',
            format!(
                "{} bytes is not a whole number of {PEER_RECORD_SIZE}-byte records",
                payload.len()
            ),
        ));
    }
    Ok(payload.chunks_exact(PEER_RECORD_SIZE).map(read_record).collect())
}

pub fn encode_heartbeat(chain_length: u32) -> Vec<u8> {
    chain_length.to_be_bytes().to_vec()
}

pub fn decode_heartbeat(payload: &[u8]) -> Result<u32> {
    let bytes: [u8; 4] = payload
        .try_into()
        .map_err(|_| invalid_payload('H', format!("expected 4 bytes, got {}", payload.len())))?;
    Ok(u32::from_be_bytes(bytes))
}

/// `None` asks for every registered node
pub fn encode_top_query(k: Option<u32>) -> Vec<u8> {
    k.map(|k| k.to_be_bytes().to_vec()).unwrap_or_default()
}

pub fn decode_top_query(payload: &[u8]) -> Result<Option<u32>> {
    match payload.len() {
        0 => Ok(None),
        4 => Ok(Some(u32::from_be_bytes([
            payload[0], payload[1], payload[2], payload[3],
        ]))),
        n => Err(invalid_payload('T', format!("expected 0 or 4 bytes, got {n}"))),
    }
}

fn read_record(record: &[u8]) -> SocketAddrV4 {
    let ip = Ipv4Addr::new(record[0], record[1], record[2], record[3]);
    SocketAddrV4::new(ip, u16::from_be_bytes([record[4], record[5]]))
}

fn invalid_payload(tag: char, reason: String) -> crate::error::ChainmeshError {
    DiscoveryError::InvalidPayload { tag, reason }.into()
}
