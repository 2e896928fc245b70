//! Tracker service: registration, heartbeats and top-k ranking

use crate::discovery::{
    decode_heartbeat, decode_peer_records, decode_top_query, encode_peer_records,
    encode_top_query, PeerRegistry, Registration, RegisteredPeer,
};
use crate::error::{ChainmeshError, NetworkError, Result};
use crate::message::{Message, MessageType};
use crate::network::{spawn_reader, Inbound, PeerId, INBOUND_CHANNEL_CAPACITY};
use std::collections::HashMap;
use std::net::{SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A running tracker
pub struct Tracker {
    local_addr: SocketAddr,
    registry: Arc<RwLock<PeerRegistry>>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Tracker {
    /// Bind the listener and start the event loop
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| NetworkError::BindFailed { addr, source })?;
        let local_addr = listener.local_addr()?;
        let registry = Arc::new(RwLock::new(PeerRegistry::new()));
        let shutdown = CancellationToken::new();

        let event_loop = TrackerLoop {
            registry: registry.clone(),
            connections: HashMap::new(),
        };
        let task = tokio::spawn(event_loop.run(listener, shutdown.clone()));
        info!(addr = %local_addr, "tracker listening");

        Ok(Self {
            local_addr,
            registry,
            shutdown,
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn registered_count(&self) -> usize {
        self.registry.read().await.registered_count()
    }

    pub async fn pending_count(&self) -> usize {
        self.registry.read().await.pending_count()
    }

    /// Registered entries in registration order
    pub async fn snapshot(&self) -> Vec<RegisteredPeer> {
        self.registry.read().await.entries().cloned().collect()
    }

    pub async fn top_k(&self, k: Option<usize>) -> Vec<SocketAddrV4> {
        self.registry.read().await.top_k(k)
    }

    pub fn is_running(&self) -> bool {
        self.task.is_some()
    }

    /// Stop accepting and close every connection
    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "tracker task ended abnormally");
            }
        }
        info!(addr = %self.local_addr, "tracker stopped");
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

struct TrackerConnection {
    writer: OwnedWriteHalf,
    reader: JoinHandle<()>,
}

struct TrackerLoop {
    registry: Arc<RwLock<PeerRegistry>>,
    connections: HashMap<PeerId, TrackerConnection>,
}

impl TrackerLoop {
    async fn run(mut self, listener: TcpListener, shutdown: CancellationToken) {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => self.accept(stream, addr, &inbound_tx).await,
                    Err(e) => warn!(error = %e, "tracker accept failed"),
                },
                Some(event) = inbound_rx.recv() => match event {
                    Inbound::Frame { from, message } => self.handle(from, message).await,
                    Inbound::Closed { from, error } => self.disconnect(from, &error).await,
                },
            }
        }

        for (_, connection) in self.connections.drain() {
            connection.reader.abort();
        }
    }

    async fn accept(&mut self, stream: TcpStream, addr: SocketAddr, inbound: &mpsc::Sender<Inbound>) {
        let _ = stream.set_nodelay(true);
        let id = PeerId::new();
        let (reader, writer) = stream.into_split();
        self.registry.write().await.connect(id, addr);
        let reader = spawn_reader(id, reader, inbound.clone());
        self.connections.insert(id, TrackerConnection { writer, reader });
        debug!(peer = %id, %addr, "tracker accepted connection");
    }

    async fn disconnect(&mut self, id: PeerId, error: &ChainmeshError) {
        if let Some(connection) = self.connections.remove(&id) {
            connection.reader.abort();
        }
        if self.registry.write().await.remove(&id) {
            info!(peer = %id, %error, "tracker dropped connection");
        }
    }

    async fn handle(&mut self, from: PeerId, message: Message) {
        match message.kind() {
            Some(MessageType::Register) => {
                let registered = match Registration::decode(message.payload()) {
                    Ok(registration) => self.registry.write().await.register(from, registration),
                    Err(e) => Err(e),
                };
                match registered {
                    Ok(peers) => {
                        info!(peer = %from, peers = peers.len(), "node registered");
                        let reply = Message::new(MessageType::PeerList, encode_peer_records(&peers));
                        self.send(from, reply).await;
                    }
                    Err(e) => warn!(peer = %from, error = %e, "registration ignored"),
                }
            }
            Some(MessageType::Heartbeat) => {
                let result = match decode_heartbeat(message.payload()) {
                    Ok(len) => self.registry.write().await.heartbeat(from, len),
                    Err(e) => Err(e),
                };
                if let Err(e) = result {
                    warn!(peer = %from, error = %e, "heartbeat ignored");
                }
            }
            Some(MessageType::TopQuery) => match decode_top_query(message.payload()) {
                Ok(k) => {
                    let top = self.registry.read().await.top_k(k.map(|k| k as usize));
                    debug!(peer = %from, k = ?k, returned = top.len(), "top-k query");
                    let reply = Message::new(MessageType::TopResponse, encode_peer_records(&top));
                    self.send(from, reply).await;
                }
                Err(e) => warn!(peer = %from, error = %e, "top-k query ignored"),
            },
            _ => {
                let error = NetworkError::ProtocolViolation {
                    tag: message.tag() as char,
                };
                warn!(peer = %from, %error, "tracker ignoring message");
            }
        }
    }

    async fn send(&mut self, to: PeerId, message: Message) {
        let Some(connection) = self.connections.get_mut(&to) else {
            return;
        };
        if let Err(error) = message.write_to(&mut connection.writer).await {
            self.disconnect(to, &error).await;
        }
    }
}

/// Ask a tracker for the announced addresses of the `k` nodes with the longest chains
pub async fn query_top_nodes(tracker_addr: SocketAddr, k: Option<u32>) -> Result<Vec<SocketAddrV4>> {
    let mut stream = TcpStream::connect(tracker_addr)
        .await
        .map_err(|source| NetworkError::ConnectionFailed {
            addr: tracker_addr,
            source,
        })?;
    Message::new(MessageType::TopQuery, encode_top_query(k))
        .write_to(&mut stream)
        .await?;

    loop {
        let reply = Message::read_from(&mut stream).await?;
        match reply.kind() {
            Some(MessageType::TopResponse) => return decode_peer_records(reply.payload()),
            _ => debug!(tag = %(reply.tag() as char), "skipping unexpected tracker reply"),
        }
    }
}
