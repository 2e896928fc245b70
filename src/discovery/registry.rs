//! Tracker-side bookkeeping of connected and registered nodes

use crate::discovery::Registration;
use crate::error::{DiscoveryError, Result};
use crate::network::PeerId;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, SocketAddrV4};

/// A node that has sent its registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredPeer {
    pub id: PeerId,
    /// Address the tracker sees the connection coming from
    pub source_addr: SocketAddr,
    pub listen_port: u16,
    pub chain_length: u32,
    /// Address announced for top-k clients
    pub node_addr: SocketAddrV4,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl RegisteredPeer {
    /// Where other nodes can dial this one
    pub fn peer_record(&self) -> Option<SocketAddrV4> {
        match self.source_addr.ip() {
            IpAddr::V4(ip) => Some(SocketAddrV4::new(ip, self.listen_port)),
            IpAddr::V6(ip) => ip
                .to_ipv4_mapped()
                .map(|ip| SocketAddrV4::new(ip, self.listen_port)),
        }
    }

    /// Announced address, with an unspecified IP replaced by the source IP
    pub fn node_record(&self) -> SocketAddrV4 {
        if !self.node_addr.ip().is_unspecified() {
            return self.node_addr;
        }
        match self.peer_record() {
            Some(source) => SocketAddrV4::new(*source.ip(), self.node_addr.port()),
            None => self.node_addr,
        }
    }
}

/// Pending connections and registered nodes, in registration order
#[derive(Debug, Default)]
pub struct PeerRegistry {
    pending: HashMap<PeerId, SocketAddr>,
    registered: IndexMap<PeerId, RegisteredPeer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection that has not registered yet
    pub fn connect(&mut self, id: PeerId, source_addr: SocketAddr) {
        self.pending.insert(id, source_addr);
    }

    /// Promote a pending connection and return the dialable records of every node registered
    /// before it
    pub fn register(&mut self, id: PeerId, registration: Registration) -> Result<Vec<SocketAddrV4>> {
        if self.registered.contains_key(&id) {
            return Err(DiscoveryError::AlreadyRegistered { id: id.to_string() }.into());
        }
        let source_addr = self
            .pending
            .remove(&id)
            .ok_or_else(|| DiscoveryError::UnknownConnection { id: id.to_string() })?;

        let peers = self.peer_list();
        self.registered.insert(
            id,
            RegisteredPeer {
                id,
                source_addr,
                listen_port: registration.listen_port,
                chain_length: 0,
                node_addr: registration.node_addr,
                registered_at: Utc::now(),
                last_heartbeat: None,
            },
        );
        Ok(peers)
    }

    pub fn heartbeat(&mut self, id: PeerId, chain_length: u32) -> Result<()> {
        let entry = self
            .registered
            .get_mut(&id)
            .ok_or_else(|| DiscoveryError::NotRegistered { id: id.to_string() })?;
        entry.chain_length = chain_length;
        entry.last_heartbeat = Some(Utc::now());
        Ok(())
    }

    /// Announced addresses of the `k` longest chains; equal lengths keep registration order
    pub fn top_k(&self, k: Option<usize>) -> Vec<SocketAddrV4> {
        let mut ranked: Vec<&RegisteredPeer> = self.registered.values().collect();
        ranked.sort_by(|a, b| b.chain_length.cmp(&a.chain_length));
        ranked
            .into_iter()
            .take(k.unwrap_or(usize::MAX))
            .map(RegisteredPeer::node_record)
            .collect()
    }

    pub fn peer_list(&self) -> Vec<SocketAddrV4> {
        self.registered
            .values()
            .filter_map(RegisteredPeer::peer_record)
            .collect()
    }

    /// Forget a connection whether or not it registered
    pub fn remove(&mut self, id: &PeerId) -> bool {
        let pending = self.pending.remove(id).is_some();
        let registered = self.registered.shift_remove(id).is_some();
        pending || registered
    }

    pub fn get(&self, id: &PeerId) -> Option<&RegisteredPeer> {
        self.registered.get(id)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RegisteredPeer> {
        self.registered.values()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }
}
