//! Chainmesh node implementation
//!
//! A node owns one [`Blockchain`] and one [`Mempool`] behind a single pool lock. Three kinds of
//! tasks drive it: the mining loop, the dispatcher that applies inbound frames in arrival order,
//! and one reader task per connection feeding the dispatcher. Peer connections are gossip
//! targets; app connections only ever receive replies.

pub mod mempool;
pub mod submission;

pub use mempool::Mempool;
pub use submission::SignedSubmission;

use crate::{
    crypto::{pow::DEFAULT_DIFFICULTY, DefaultVerifier, SignatureVerifier},
    discovery::{DiscoveryConfig, DiscoveryHandler, P2PClient},
    error::{ChainmeshError, CryptoError, NetworkError, Result},
    ledger::{Block, Blockchain, MergeOutcome},
    message::{Message, MessageType},
    network::{
        spawn_reader, ConnectionKind, Inbound, PeerId, PeerInfo, INBOUND_CHANNEL_CAPACITY,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, Notify, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Name used in logs and state dumps
    pub name: String,

    /// Leading zero hex digits required of every block hash
    pub difficulty: usize,

    /// Whether the mining loop picks up pending payloads
    pub mining_enabled: bool,

    /// Optional listener for application front ends
    pub app_addr: Option<SocketAddr>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            name: "node".to_string(),
            difficulty: DEFAULT_DIFFICULTY,
            mining_enabled: true,
            app_addr: None,
        }
    }
}

/// Main node structure
pub struct Node {
    shared: Arc<NodeShared>,
    app_addr: Option<SocketAddr>,
    app_local_addr: Option<SocketAddr>,
    discovery_config: Option<DiscoveryConfig>,
    discovery: Option<P2PClient>,
    inbound_rx: Option<mpsc::Receiver<Inbound>>,
    tasks: Vec<JoinHandle<()>>,
}

impl Node {
    /// Create a node with the given configuration and the default signature verifier
    pub fn new(config: NodeConfig) -> Result<Self> {
        Self::builder().with_config(config).build()
    }

    /// Create a builder for this node
    pub fn builder() -> NodeBuilder {
        NodeBuilder::new()
    }

    /// Start mining, dispatching and, when configured, the app listener and discovery
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        let inbound_rx = self
            .inbound_rx
            .take()
            .ok_or_else(|| ChainmeshError::generic("a stopped node cannot be restarted"))?;
        let shared = self.shared.clone();

        self.tasks.push(tokio::spawn(dispatch_loop(shared.clone(), inbound_rx)));
        self.tasks.push(tokio::spawn(mining_loop(shared.clone())));
        shared.running.store(true, Ordering::SeqCst);

        if let Some(addr) = self.app_addr {
            let listener = match TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(source) => {
                    self.stop().await?;
                    return Err(NetworkError::BindFailed { addr, source }.into());
                }
            };
            let local = listener.local_addr()?;
            self.app_local_addr = Some(local);
            self.tasks.push(tokio::spawn(app_accept_loop(shared.clone(), listener)));
            info!(node = %shared.name, addr = %local, "app listener started");
        }

        if let Some(mut config) = self.discovery_config.clone() {
            if config.node_addr.is_none() {
                if let Some(SocketAddr::V4(app)) = self.app_local_addr {
                    config.node_addr = Some(app);
                }
            }
            let handler: Arc<dyn DiscoveryHandler> = shared.clone();
            match P2PClient::start(config, handler).await {
                Ok(client) => self.discovery = Some(client),
                Err(e) => {
                    self.stop().await?;
                    return Err(e);
                }
            }
        }

        info!(node = %shared.name, difficulty = shared.difficulty, "node started");
        Ok(())
    }

    /// Stop every task and drop all connections
    pub async fn stop(&mut self) -> Result<()> {
        let shared = &self.shared;
        shared.running.store(false, Ordering::SeqCst);
        shared.shutdown.cancel();
        shared.mining_enabled.store(false, Ordering::SeqCst);
        shared.stop_mining.store(true, Ordering::SeqCst);
        shared.pool_has_job.notify_one();
        shared.peer_joined.notify_waiters();

        if let Some(mut discovery) = self.discovery.take() {
            discovery.stop().await;
        }
        for joined in futures::future::join_all(self.tasks.drain(..)).await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    warn!(node = %shared.name, error = %e, "node task ended abnormally");
                }
            }
        }

        let connections: Vec<Connection> = shared
            .connections
            .write()
            .await
            .drain()
            .map(|(_, connection)| connection)
            .collect();
        for connection in connections {
            connection.reader.abort();
            let _ = connection.writer.lock().await.shutdown().await;
        }

        info!(node = %shared.name, "node stopped");
        Ok(())
    }

    /// Check if the node is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Leading zero hex digits required of block hashes
    pub fn difficulty(&self) -> usize {
        self.shared.difficulty
    }

    /// Adopt an established stream as a gossip peer and ask it for its chain
    pub async fn join_peer<S>(&self, stream: S) -> PeerId
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.shared.join(stream, ConnectionKind::Peer, None).await
    }

    /// Adopt an established stream as an application client
    pub async fn attach_app<S>(&self, stream: S) -> PeerId
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.shared.join(stream, ConnectionKind::App, None).await
    }

    /// Dial `addr` and join it as a gossip peer
    pub async fn connect_peer(&self, addr: SocketAddr) -> Result<PeerId> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| NetworkError::ConnectionFailed { addr, source })?;
        let _ = stream.set_nodelay(true);
        Ok(self.shared.join(stream, ConnectionKind::Peer, Some(addr)).await)
    }

    /// Accept a signed payload as if an app had sent it: verify, queue and gossip it.
    ///
    /// Returns whether the payload was newly queued.
    pub async fn submit(&self, submission: SignedSubmission) -> Result<bool> {
        if !self.is_running() {
            return Err(NetworkError::NotRunning.into());
        }
        if !submission.verify(self.shared.verifier.as_ref()) {
            return Err(CryptoError::InvalidSignature.into());
        }
        let queued = self.shared.enqueue(submission.data().to_vec()).await;
        let gossip = Message::new(MessageType::NewBlock, submission.encode());
        self.shared.broadcast(&gossip, None).await;
        Ok(queued)
    }

    /// Pause or resume mining; pausing interrupts the current nonce search
    pub fn set_mining(&self, enabled: bool) {
        self.shared.set_mining(enabled);
    }

    /// Whether mining is enabled
    pub fn is_mining(&self) -> bool {
        self.shared.mining_enabled.load(Ordering::SeqCst)
    }

    /// Current chain length
    pub async fn chain_len(&self) -> usize {
        self.shared.pool.lock().await.ledger.len()
    }

    /// Snapshot of the current chain
    pub async fn chain(&self) -> Vec<Block> {
        self.shared.pool.lock().await.ledger.blocks().to_vec()
    }

    /// Hash of the chain tip
    pub async fn tip_hash(&self) -> Option<String> {
        self.shared.pool.lock().await.ledger.tip_hash()
    }

    /// Re-verify the local chain
    pub async fn is_chain_valid(&self) -> bool {
        self.shared.pool.lock().await.ledger.is_valid()
    }

    /// Number of pending payloads
    pub async fn mempool_len(&self) -> usize {
        self.shared.pool.lock().await.mempool.len()
    }

    /// Number of gossip peers (app clients excluded)
    pub async fn peer_count(&self) -> usize {
        self.shared.count(ConnectionKind::Peer).await
    }

    /// Number of application clients
    pub async fn app_count(&self) -> usize {
        self.shared.count(ConnectionKind::App).await
    }

    /// Every live connection, peers and apps alike
    pub async fn peers(&self) -> Vec<PeerInfo> {
        self.shared
            .connections
            .read()
            .await
            .values()
            .map(|c| c.info.clone())
            .collect()
    }

    /// Wait until at least `count` gossip peers are connected
    pub async fn wait_for_peers(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let joined = self.shared.peer_joined.notified();
                tokio::pin!(joined);
                joined.as_mut().enable();
                if self.peer_count().await >= count {
                    return true;
                }
                if self.shared.shutdown.is_cancelled() {
                    return false;
                }
                joined.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    /// Bound address of the app listener, once started
    pub fn app_addr(&self) -> Option<SocketAddr> {
        self.app_local_addr
    }

    /// Bound address of the discovery listener, once started
    pub fn p2p_addr(&self) -> Option<SocketAddr> {
        self.discovery.as_ref().map(P2PClient::listen_addr)
    }

    /// Get node state for debugging
    pub async fn get_state(&self) -> Result<serde_json::Value> {
        let (chain_length, tip, valid, mempool) = {
            let pool = self.shared.pool.lock().await;
            (
                pool.ledger.len(),
                pool.ledger.tip_hash(),
                pool.ledger.is_valid(),
                pool.mempool.len(),
            )
        };
        Ok(serde_json::json!({
            "name": self.shared.name,
            "running": self.is_running(),
            "mining": self.is_mining(),
            "difficulty": self.shared.difficulty,
            "chain_length": chain_length,
            "tip": tip,
            "chain_valid": valid,
            "mempool": mempool,
            "peer_count": self.peer_count().await,
            "app_count": self.app_count().await,
            "app_addr": self.app_local_addr.map(|a| a.to_string()),
            "p2p_addr": self.p2p_addr().map(|a| a.to_string()),
        }))
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
        self.shared.stop_mining.store(true, Ordering::SeqCst);
    }
}

/// Builder for nodes
pub struct NodeBuilder {
    config: NodeConfig,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    discovery: Option<DiscoveryConfig>,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self {
            config: NodeConfig::default(),
            verifier: None,
            discovery: None,
        }
    }

    pub fn with_config(mut self, config: NodeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn difficulty(mut self, difficulty: usize) -> Self {
        self.config.difficulty = difficulty;
        self
    }

    pub fn mining(mut self, enabled: bool) -> Self {
        self.config.mining_enabled = enabled;
        self
    }

    /// Replace the signature check applied to `A` and `N` submissions
    pub fn verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn app_addr(mut self, addr: SocketAddr) -> Self {
        self.config.app_addr = Some(addr);
        self
    }

    /// Register with a tracker on start
    pub fn discovery(mut self, config: DiscoveryConfig) -> Self {
        self.discovery = Some(config);
        self
    }

    /// Build the node
    pub fn build(self) -> Result<Node> {
        let config = self.config;
        if config.difficulty > crate::crypto::hash::HASH_HEX_LEN {
            return Err(ChainmeshError::config(format!(
                "difficulty {} exceeds the {} hex digits of a hash",
                config.difficulty,
                crate::crypto::hash::HASH_HEX_LEN
            )));
        }

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let shared = Arc::new(NodeShared {
            name: config.name,
            difficulty: config.difficulty,
            pool: Mutex::new(Pool {
                ledger: Blockchain::with_difficulty(config.difficulty),
                mempool: Mempool::new(),
            }),
            pool_has_job: Notify::new(),
            connections: RwLock::new(HashMap::new()),
            peer_joined: Notify::new(),
            mining_enabled: AtomicBool::new(config.mining_enabled),
            stop_mining: Arc::new(AtomicBool::new(false)),
            running: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
            verifier: self.verifier.unwrap_or_else(|| Arc::new(DefaultVerifier)),
            inbound_tx,
        });

        Ok(Node {
            shared,
            app_addr: config.app_addr,
            app_local_addr: None,
            discovery_config: self.discovery,
            discovery: None,
            inbound_rx: Some(inbound_rx),
            tasks: Vec::new(),
        })
    }
}

impl Default for NodeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

struct Pool {
    ledger: Blockchain,
    mempool: Mempool,
}

struct Connection {
    info: PeerInfo,
    writer: Arc<Mutex<BoxedWriter>>,
    reader: JoinHandle<()>,
}

/// State shared by the node handle and its tasks
struct NodeShared {
    name: String,
    difficulty: usize,
    pool: Mutex<Pool>,
    /// Single waiter: the mining loop
    pool_has_job: Notify,
    connections: RwLock<HashMap<PeerId, Connection>>,
    peer_joined: Notify,
    mining_enabled: AtomicBool,
    stop_mining: Arc<AtomicBool>,
    running: AtomicBool,
    shutdown: CancellationToken,
    verifier: Arc<dyn SignatureVerifier>,
    inbound_tx: mpsc::Sender<Inbound>,
}

impl NodeShared {
    async fn join<S>(&self, stream: S, kind: ConnectionKind, address: Option<SocketAddr>) -> PeerId
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        let id = PeerId::new();
        {
            // Held across the spawn so the dispatcher cannot see a frame from an unknown id
            let mut connections = self.connections.write().await;
            let reader = spawn_reader(id, reader, self.inbound_tx.clone());
            connections.insert(
                id,
                Connection {
                    info: PeerInfo::new(id, kind, address),
                    writer: Arc::new(Mutex::new(Box::new(writer))),
                    reader,
                },
            );
        }
        info!(node = %self.name, peer = %id, ?kind, "connection joined");

        if kind == ConnectionKind::Peer {
            self.peer_joined.notify_waiters();
            self.send_to(id, &Message::new(MessageType::PullRequest, Vec::new()))
                .await;
        }
        id
    }

    async fn count(&self, kind: ConnectionKind) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.info.kind == kind)
            .count()
    }

    async fn drop_connection(&self, id: PeerId, reason: &ChainmeshError) {
        let removed = self.connections.write().await.remove(&id);
        if let Some(connection) = removed {
            connection.reader.abort();
            info!(node = %self.name, peer = %id, %reason, "connection removed");
        }
    }

    async fn send_to(&self, id: PeerId, message: &Message) {
        let writer = self
            .connections
            .read()
            .await
            .get(&id)
            .map(|c| c.writer.clone());
        let Some(writer) = writer else {
            debug!(node = %self.name, peer = %id, "reply target already gone");
            return;
        };
        let sent = message.write_to(&mut *writer.lock().await).await;
        if let Err(e) = sent {
            self.drop_connection(id, &e).await;
        }
    }

    /// Send to every gossip peer except `except`
    async fn broadcast(&self, message: &Message, except: Option<PeerId>) {
        let targets: Vec<(PeerId, Arc<Mutex<BoxedWriter>>)> = self
            .connections
            .read()
            .await
            .iter()
            .filter(|(id, c)| c.info.kind == ConnectionKind::Peer && Some(**id) != except)
            .map(|(id, c)| (*id, c.writer.clone()))
            .collect();

        for (id, writer) in targets {
            let sent = message.write_to(&mut *writer.lock().await).await;
            if let Err(e) = sent {
                self.drop_connection(id, &e).await;
            }
        }
    }

    fn set_mining(&self, enabled: bool) {
        self.mining_enabled.store(enabled, Ordering::SeqCst);
        self.stop_mining.store(!enabled, Ordering::SeqCst);
        if enabled {
            self.pool_has_job.notify_one();
        }
    }

    /// Queue a payload unless it is already pending or on the chain
    async fn enqueue(&self, data: Vec<u8>) -> bool {
        let queued = {
            let mut pool = self.pool.lock().await;
            !pool.ledger.contains_payload(&data) && pool.mempool.insert(data)
        };
        if queued {
            self.pool_has_job.notify_one();
        }
        queued
    }

    /// Wait for a pending payload and link it to the current tip
    async fn next_candidate(&self) -> Option<Block> {
        loop {
            if self.shutdown.is_cancelled() {
                return None;
            }
            if self.mining_enabled.load(Ordering::SeqCst) {
                let pool = self.pool.lock().await;
                if let Some(data) = pool.mempool.next() {
                    return Some(pool.ledger.prepare(Block::new(data.clone())));
                }
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => return None,
                _ = self.pool_has_job.notified() => {}
            }
        }
    }

    /// Append a freshly mined block if nothing overtook it, then announce it
    async fn commit_mined(&self, block: Block) {
        let committed = {
            let mut pool = self.pool.lock().await;
            if !pool.mempool.contains(&block.data) {
                debug!(node = %self.name, "payload settled elsewhere, discarding mined block");
                false
            } else if let Err(e) = pool.ledger.add(block.clone()) {
                debug!(node = %self.name, error = %e, "tip moved, discarding mined block");
                false
            } else {
                pool.mempool.remove(&block.data);
                true
            }
        };

        if committed {
            info!(node = %self.name, hash = %block.hash(), nonce = block.nonce, "mined block");
            self.broadcast(&Message::new(MessageType::MinedBlock, block.encode()), None)
                .await;
        }
    }

    async fn handle_message(&self, from: PeerId, message: Message) {
        debug!(node = %self.name, peer = %from, tag = %(message.tag() as char), len = message.payload().len(), "frame");
        match message.kind() {
            Some(MessageType::NewBlock) => self.handle_submission(from, &message, false).await,
            Some(MessageType::AppBlock) => self.handle_submission(from, &message, true).await,
            Some(MessageType::MinedBlock) => self.handle_mined(from, &message).await,
            Some(MessageType::PullRequest) => {
                let chain = self.pool.lock().await.ledger.encode();
                self.send_to(from, &Message::new(MessageType::Chain, chain))
                    .await;
            }
            Some(MessageType::Chain) => self.handle_chain(from, &message).await,
            _ => {
                let error = NetworkError::ProtocolViolation {
                    tag: message.tag() as char,
                };
                warn!(node = %self.name, peer = %from, %error, "ignoring message");
            }
        }
    }

    async fn handle_submission(&self, from: PeerId, message: &Message, forward: bool) {
        let submission = match SignedSubmission::decode(message.payload()) {
            Ok(submission) => submission,
            Err(e) => {
                warn!(node = %self.name, peer = %from, error = %e, "undecodable submission");
                return;
            }
        };
        if !submission.verify(self.verifier.as_ref()) {
            debug!(node = %self.name, peer = %from, "dropping submission with invalid signature");
            return;
        }

        let queued = self.enqueue(submission.data().to_vec()).await;
        debug!(node = %self.name, peer = %from, queued, "accepted submission");
        if forward {
            let gossip = Message::new(MessageType::NewBlock, message.payload().to_vec());
            self.broadcast(&gossip, Some(from)).await;
        }
    }

    async fn handle_mined(&self, from: PeerId, message: &Message) {
        let block = match Block::decode(message.payload()) {
            Ok(block) => block,
            Err(e) => {
                warn!(node = %self.name, peer = %from, error = %e, "undecodable block");
                return;
            }
        };

        let pull = {
            let mut pool = self.pool.lock().await;
            if pool.ledger.contains_block(&block.hash()) {
                return;
            }
            if pool.ledger.is_attachable(&block) {
                pool.mempool.remove(&block.data);
                match pool.ledger.add(block) {
                    Ok(()) => debug!(node = %self.name, peer = %from, len = pool.ledger.len(), "appended peer block"),
                    Err(e) => error!(node = %self.name, error = %e, "attachable block rejected"),
                }
                false
            } else {
                true
            }
        };

        if pull {
            debug!(node = %self.name, peer = %from, "block does not attach, pulling chain");
            self.send_to(from, &Message::new(MessageType::PullRequest, Vec::new()))
                .await;
        }
    }

    async fn handle_chain(&self, from: PeerId, message: &Message) {
        let remote = match Blockchain::decode(message.payload(), self.difficulty) {
            Ok(remote) => remote,
            Err(e) => {
                warn!(node = %self.name, peer = %from, error = %e, "rejecting chain transfer");
                return;
            }
        };

        let requeued = {
            let mut pool = self.pool.lock().await;
            let Pool { ledger, mempool } = &mut *pool;
            let outcome = ledger.merge_chain(remote.into_blocks());
            let MergeOutcome::Merged {
                fork_point,
                discarded,
            } = outcome
            else {
                return;
            };

            mempool.retain(|data| !ledger.contains_payload(data));
            let mut requeued = 0;
            for block in discarded {
                if !ledger.contains_payload(&block.data) && mempool.insert(block.data) {
                    requeued += 1;
                }
            }
            info!(
                node = %self.name,
                peer = %from,
                ?fork_point,
                len = ledger.len(),
                requeued,
                "merged remote chain"
            );
            requeued
        };

        if requeued > 0 {
            self.pool_has_job.notify_one();
        }
    }
}

#[async_trait]
impl DiscoveryHandler for NodeShared {
    async fn on_peer_joined(&self, stream: TcpStream, address: SocketAddr) {
        self.join(stream, ConnectionKind::Peer, Some(address)).await;
    }

    async fn chain_length(&self) -> u32 {
        let len = self.pool.lock().await.ledger.len();
        u32::try_from(len).unwrap_or(u32::MAX)
    }

    async fn peer_count(&self) -> usize {
        self.count(ConnectionKind::Peer).await
    }
}

async fn dispatch_loop(shared: Arc<NodeShared>, mut inbound: mpsc::Receiver<Inbound>) {
    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            event = inbound.recv() => match event {
                Some(Inbound::Frame { from, message }) => shared.handle_message(from, message).await,
                Some(Inbound::Closed { from, error }) => shared.drop_connection(from, &error).await,
                None => break,
            },
        }
    }
    debug!(node = %shared.name, "dispatcher stopped");
}

async fn mining_loop(shared: Arc<NodeShared>) {
    while let Some(candidate) = shared.next_candidate().await {
        let stop = shared.stop_mining.clone();
        let difficulty = shared.difficulty;
        let solved =
            tokio::task::spawn_blocking(move || candidate.solve(difficulty, &stop)).await;
        match solved {
            Ok(Some(block)) => shared.commit_mined(block).await,
            Ok(None) => debug!(node = %shared.name, "nonce search interrupted"),
            Err(e) => {
                error!(node = %shared.name, error = %e, "nonce search panicked");
                break;
            }
        }
    }
    debug!(node = %shared.name, "mining loop stopped");
}

async fn app_accept_loop(shared: Arc<NodeShared>, listener: TcpListener) {
    loop {
        tokio::select! {
            _ = shared.shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let _ = stream.set_nodelay(true);
                    shared.join(stream, ConnectionKind::App, Some(addr)).await;
                }
                Err(e) => warn!(node = %shared.name, error = %e, "app accept failed"),
            },
        }
    }
}
