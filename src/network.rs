//! Connection identities and reader tasks shared by the node and the tracker

use crate::error::ChainmeshError;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

/// Capacity of the channel that collects frames from every connection
pub const INBOUND_CHANNEL_CAPACITY: usize = 1024;

/// Unique identifier for a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(Uuid);

impl PeerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for PeerId {
    fn default() -> Self {
        Self::new()
    }
}

/// What a connection is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectionKind {
    /// Another node; receives gossip
    Peer,
    /// An application front end; only receives replies
    App,
}

/// Information about a connection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub id: PeerId,
    pub kind: ConnectionKind,
    pub address: Option<SocketAddr>,
    pub connected_at: chrono::DateTime<chrono::Utc>,
}

impl PeerInfo {
    pub fn new(id: PeerId, kind: ConnectionKind, address: Option<SocketAddr>) -> Self {
        Self {
            id,
            kind,
            address,
            connected_at: chrono::Utc::now(),
        }
    }
}

/// Event produced by a connection reader task
#[derive(Debug)]
pub(crate) enum Inbound {
    Frame { from: PeerId, message: Message },
    Closed { from: PeerId, error: ChainmeshError },
}

/// Read frames from `reader` until the stream fails, forwarding each one to `inbound`.
///
/// The task ends after reporting `Inbound::Closed`, or silently when the receiver is gone.
pub(crate) fn spawn_reader<R>(
    from: PeerId,
    mut reader: R,
    inbound: mpsc::Sender<Inbound>,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match Message::read_from(&mut reader).await {
                Ok(message) => {
                    if inbound.send(Inbound::Frame { from, message }).await.is_err() {
                        debug!(peer = %from, "inbound channel closed, reader exiting");
                        return;
                    }
                }
                // A read error leaves the stream mid-frame, so every error closes it
                Err(error) => {
                    let _ = inbound.send(Inbound::Closed { from, error }).await;
                    return;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn test_reader_forwards_frames_then_reports_close() {
        let (mut near, far) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);
        let id = PeerId::new();
        let handle = spawn_reader(id, far, tx);

        Message::new(MessageType::PullRequest, Vec::new())
            .write_to(&mut near)
            .await
            .unwrap();
        near.shutdown().await.unwrap();
        drop(near);

        match rx.recv().await.unwrap() {
            Inbound::Frame { from, message } => {
                assert_eq!(from, id);
                assert_eq!(message.kind(), Some(MessageType::PullRequest));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            Inbound::Closed { from, .. } if from == id
        ));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_oversized_frame_closes_connection() {
        let (mut near, far) = tokio::io::duplex(1024);
        let (tx, mut rx) = mpsc::channel(8);
        let id = PeerId::new();
        let handle = spawn_reader(id, far, tx);

        let mut header = vec![b'C'];
        header.extend_from_slice(&u64::MAX.to_be_bytes());
        near.write_all(&header).await.unwrap();

        match rx.recv().await.unwrap() {
            Inbound::Closed { from, error } => {
                assert_eq!(from, id);
                assert!(matches!(
                    error,
                    ChainmeshError::Network(crate::error::NetworkError::MessageTooLarge { .. })
                ));
            }
            other => panic!("unexpected event {other:?}"),
        }
        handle.await.unwrap();
    }
}
