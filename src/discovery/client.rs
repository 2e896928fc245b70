//! Node-side discovery: registration, peer dialing and heartbeats

use crate::discovery::{
    decode_peer_records, encode_heartbeat, DiscoveryConfig, DiscoveryHandler, Registration,
};
use crate::error::{NetworkError, Result};
use crate::message::{Message, MessageType};
use crate::network::{spawn_reader, Inbound, PeerId, INBOUND_CHANNEL_CAPACITY};
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::Arc;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type TrackerWriter = Arc<Mutex<Option<OwnedWriteHalf>>>;

/// Registers with a tracker and hands every discovered peer connection to a [`DiscoveryHandler`]
pub struct P2PClient {
    listen_addr: SocketAddr,
    shutdown: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl P2PClient {
    /// Bind the peer listener, register with the tracker and start the background tasks
    pub async fn start(config: DiscoveryConfig, handler: Arc<dyn DiscoveryHandler>) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr)
            .await
            .map_err(|source| NetworkError::BindFailed {
                addr: config.listen_addr,
                source,
            })?;
        let listen_addr = listener.local_addr()?;
        let registration = Registration::new(
            listen_addr.port(),
            config
                .node_addr
                .unwrap_or_else(|| SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0)),
        );

        let (tracker_reader, tracker_writer) = register(&config, &registration).await?;
        info!(listen = %listen_addr, tracker = %config.tracker_addr, "registered with tracker");

        let shutdown = CancellationToken::new();
        let writer: TrackerWriter = Arc::new(Mutex::new(Some(tracker_writer)));

        let heartbeat = tokio::spawn(heartbeat_loop(
            writer.clone(),
            handler.clone(),
            config.clone(),
            shutdown.clone(),
        ));
        let event_loop = ClientLoop {
            config,
            registration,
            handler,
            writer,
            dialed: HashSet::new(),
            rejoined: false,
        };
        let events = tokio::spawn(event_loop.run(listener, tracker_reader, shutdown.clone()));

        Ok(Self {
            listen_addr,
            shutdown,
            tasks: vec![events, heartbeat],
        })
    }

    /// Address peers can dial
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }

    /// False once the client stopped, either on request or after losing the tracker
    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    pub async fn stop(&mut self) {
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!(error = %e, "discovery task ended abnormally");
            }
        }
    }
}

impl Drop for P2PClient {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn register(
    config: &DiscoveryConfig,
    registration: &Registration,
) -> Result<(OwnedReadHalf, OwnedWriteHalf)> {
    let stream = dial(config.tracker_addr, config).await?;
    let (reader, mut writer) = stream.into_split();
    Message::new(MessageType::Register, registration.encode())
        .write_to(&mut writer)
        .await?;
    Ok((reader, writer))
}

async fn dial(addr: SocketAddr, config: &DiscoveryConfig) -> Result<TcpStream> {
    let timeout = config.connect_timeout();
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| NetworkError::Timeout { duration: timeout })?
        .map_err(|source| NetworkError::ConnectionFailed { addr, source })?;
    let _ = stream.set_nodelay(true);
    Ok(stream)
}

async fn heartbeat_loop(
    writer: TrackerWriter,
    handler: Arc<dyn DiscoveryHandler>,
    config: DiscoveryConfig,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.heartbeat_interval());
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let chain_length = handler.chain_length().await;
        let mut guard = writer.lock().await;
        let Some(stream) = guard.as_mut() else {
            continue;
        };
        let heartbeat = Message::new(MessageType::Heartbeat, encode_heartbeat(chain_length));
        if let Err(e) = heartbeat.write_to(stream).await {
            warn!(error = %e, "heartbeat failed");
            *guard = None;
        }
    }
}

struct ClientLoop {
    config: DiscoveryConfig,
    registration: Registration,
    handler: Arc<dyn DiscoveryHandler>,
    writer: TrackerWriter,
    dialed: HashSet<SocketAddrV4>,
    /// Set between a re-registration and the peer list answering it
    rejoined: bool,
}

impl ClientLoop {
    async fn run(mut self, listener: TcpListener, tracker: OwnedReadHalf, shutdown: CancellationToken) {
        let (inbound_tx, mut inbound_rx) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        let tracker_id = PeerId::new();
        let mut reader = spawn_reader(tracker_id, tracker, inbound_tx.clone());

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        let _ = stream.set_nodelay(true);
                        debug!(%addr, "accepted peer");
                        self.handler.on_peer_joined(stream, addr).await;
                    }
                    Err(e) => warn!(error = %e, "peer accept failed"),
                },
                Some(event) = inbound_rx.recv() => match event {
                    Inbound::Frame { message, .. } => self.handle(message).await,
                    Inbound::Closed { error, .. } => {
                        warn!(%error, "lost tracker connection");
                        *self.writer.lock().await = None;
                        match self.reconnect(&shutdown).await {
                            Some(tracker) => {
                                reader = spawn_reader(tracker_id, tracker, inbound_tx.clone());
                            }
                            None => break,
                        }
                    }
                },
            }
        }

        reader.abort();
        shutdown.cancel();
        debug!("discovery event loop stopped");
    }

    async fn handle(&mut self, message: Message) {
        match message.kind() {
            Some(MessageType::PeerList) => match decode_peer_records(message.payload()) {
                Ok(peers) => {
                    debug!(count = peers.len(), "received peer list");
                    if std::mem::take(&mut self.rejoined) {
                        // Inbound links carry no listen address, so a live mesh cannot be
                        // matched against the list; keep it rather than dial duplicates
                        let live = self.handler.peer_count().await;
                        if live > 0 {
                            info!(live, listed = peers.len(), "mesh still connected, not redialing");
                            self.dialed.extend(peers);
                            return;
                        }
                    }
                    for peer in peers {
                        self.dial_peer(peer).await;
                    }
                }
                Err(e) => warn!(error = %e, "ignoring peer list"),
            },
            _ => {
                let error = NetworkError::ProtocolViolation {
                    tag: message.tag() as char,
                };
                warn!(%error, "unexpected message from tracker");
            }
        }
    }

    async fn dial_peer(&mut self, peer: SocketAddrV4) {
        if !self.dialed.insert(peer) {
            return;
        }
        let addr = SocketAddr::V4(peer);
        match dial(addr, &self.config).await {
            Ok(stream) => {
                debug!(%addr, "dialed peer");
                self.handler.on_peer_joined(stream, addr).await;
            }
            Err(e) => warn!(%addr, error = %e, "could not reach peer"),
        }
    }

    /// Re-register until it succeeds; `None` when reconnecting is disabled or shutdown wins
    async fn reconnect(&mut self, shutdown: &CancellationToken) -> Option<OwnedReadHalf> {
        let Some(interval) = self.config.reconnect_interval() else {
            info!("discovery stopped, keeping existing peers");
            return None;
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => return None,
                _ = tokio::time::sleep(interval) => {}
            }
            match register(&self.config, &self.registration).await {
                Ok((reader, writer)) => {
                    *self.writer.lock().await = Some(writer);
                    self.rejoined = true;
                    info!(tracker = %self.config.tracker_addr, "re-registered with tracker");
                    return Some(reader);
                }
                Err(e) => debug!(error = %e, "tracker still unreachable"),
            }
        }
    }
}
