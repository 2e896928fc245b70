//! Binary message framing
//!
//! Every frame is `tag:1 || length:u64 BE || payload:length`. The same framing is used
//! between nodes, between nodes and the tracker, and inside signed submissions to carry
//! the public key as an embedded sub-message.

use crate::error::{ChainmeshError, NetworkError, Result};
use bytes::{BufMut, BytesMut};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of the frame header in bytes
pub const HEADER_SIZE: usize = 9;

/// Upper bound accepted for a single payload
pub const MAX_PAYLOAD_SIZE: u64 = 256 * 1024 * 1024;

/// Message tags understood by nodes and the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Signed payload relayed by a peer
    NewBlock,
    /// Signed payload submitted by an application
    AppBlock,
    /// Mined block announcement
    MinedBlock,
    /// Request for the full chain
    PullRequest,
    /// Full chain transfer
    Chain,
    /// Public key sub-message inside a signed submission
    PublicKey,
    /// Tracker registration
    Register,
    /// Tracker peer list
    PeerList,
    /// Chain length heartbeat
    Heartbeat,
    /// Top-k query
    TopQuery,
    /// Top-k response
    TopResponse,
}

impl MessageType {
    /// Wire tag for this type
    pub fn tag(self) -> u8 {
        match self {
            MessageType::NewBlock => b'N',
            MessageType::AppBlock => b'A',
            MessageType::MinedBlock => b'M',
            MessageType::PullRequest => b'P',
            MessageType::Chain => b'C',
            MessageType::PublicKey => b'K',
            MessageType::Register => b'R',
            MessageType::PeerList => b'L',
            MessageType::Heartbeat => b'H',
            MessageType::TopQuery => b'T',
            MessageType::TopResponse => b'S',
        }
    }

    /// Look up a tag; unknown tags yield `None`
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'N' => MessageType::NewBlock,
            b'A' => MessageType::AppBlock,
            b'M' => MessageType::MinedBlock,
            b'P' => MessageType::PullRequest,
            b'C' => MessageType::Chain,
            b'K' => MessageType::PublicKey,
            b'R' => MessageType::Register,
            b'L' => MessageType::PeerList,
            b'H' => MessageType::Heartbeat,
            b'T' => MessageType::TopQuery,
            b'S' => MessageType::TopResponse,
            _ => return None,
        })
    }
}

/// A single framed message
#[derive(Clone, PartialEq, Eq)]
pub struct Message {
    tag: u8,
    payload: Vec<u8>,
}

impl Message {
    /// Build a message of a known type
    pub fn new(kind: MessageType, payload: impl Into<Vec<u8>>) -> Self {
        Self::with_tag(kind.tag(), payload)
    }

    /// Build a message from a raw tag byte
    pub fn with_tag(tag: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// Raw tag byte
    pub fn tag(&self) -> u8 {
        self.tag
    }

    /// Decoded type, `None` for tags outside the protocol
    pub fn kind(&self) -> Option<MessageType> {
        MessageType::from_tag(self.tag)
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Serialize to `header || payload`
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_u8(self.tag);
        buf.put_u64(self.payload.len() as u64);
        buf.put_slice(&self.payload);
        buf.to_vec()
    }

    /// Decode one message from the front of `buf`, returning the unconsumed rest
    pub fn unpack(buf: &[u8]) -> Result<(Message, &[u8])> {
        if buf.len() < HEADER_SIZE {
            return Err(ChainmeshError::malformed(format!(
                "buffer of {} bytes is shorter than the header",
                buf.len()
            )));
        }
        let (tag, size) = parse_header(&buf[..HEADER_SIZE]);
        let body = &buf[HEADER_SIZE..];
        if (body.len() as u64) < size {
            return Err(ChainmeshError::malformed(format!(
                "header declares {} payload bytes but only {} remain",
                size,
                body.len()
            )));
        }
        let size = size as usize;
        Ok((Message::with_tag(tag, &body[..size]), &body[size..]))
    }

    /// Read exactly one frame from a stream
    pub async fn read_from<R>(reader: &mut R) -> Result<Message>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let mut header = [0u8; HEADER_SIZE];
        let mut filled = 0;
        while filled < HEADER_SIZE {
            let n = reader.read(&mut header[filled..]).await?;
            if n == 0 {
                return Err(if filled == 0 {
                    NetworkError::ConnectionClosed.into()
                } else {
                    NetworkError::MalformedHeader {
                        received: filled,
                        expected: HEADER_SIZE,
                    }
                    .into()
                });
            }
            filled += n;
        }

        let (tag, size) = parse_header(&header);
        if size > MAX_PAYLOAD_SIZE {
            return Err(NetworkError::MessageTooLarge {
                size,
                max_size: MAX_PAYLOAD_SIZE,
            }
            .into());
        }

        let mut payload = vec![0u8; size as usize];
        match reader.read_exact(&mut payload).await {
            Ok(_) => Ok(Message::with_tag(tag, payload)),
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(
                ChainmeshError::malformed("connection closed while reading payload"),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the packed frame and flush
    pub async fn write_to<W>(&self, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        writer.write_all(&self.pack()).await?;
        writer.flush().await?;
        Ok(())
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("tag", &(self.tag as char))
            .field("len", &self.payload.len())
            .finish()
    }
}

fn parse_header(header: &[u8]) -> (u8, u64) {
    let mut size = [0u8; 8];
    size.copy_from_slice(&header[1..HEADER_SIZE]);
    (header[0], u64::from_be_bytes(size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_layout() {
        let packed = Message::new(MessageType::AppBlock, b"Hello, World!".to_vec()).pack();
        assert_eq!(packed[0], b'A');
        assert_eq!(&packed[1..9], &13u64.to_be_bytes());
        assert_eq!(&packed[9..], b"Hello, World!");
    }

    #[test]
    fn test_unpack_returns_remainder() {
        let inner = Message::new(MessageType::PublicKey, b"key".to_vec()).pack();
        let mut buf = inner.clone();
        buf.extend_from_slice(b"signature-and-data");

        let (msg, rest) = Message::unpack(&buf).unwrap();
        assert_eq!(msg.kind(), Some(MessageType::PublicKey));
        assert_eq!(msg.payload(), b"key");
        assert_eq!(rest, b"signature-and-data");
    }

    #[test]
    fn test_unpack_rejects_short_buffers() {
        assert!(Message::unpack(b"A\0\0").is_err());

        let mut packed = Message::new(MessageType::Chain, vec![7u8; 10]).pack();
        packed.truncate(packed.len() - 1);
        assert!(Message::unpack(&packed).is_err());
    }

    #[tokio::test]
    async fn test_read_from_stream() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let msg = Message::new(MessageType::MinedBlock, b"block".to_vec());
        msg.write_to(&mut a).await.unwrap();
        Message::new(MessageType::PullRequest, Vec::new())
            .write_to(&mut a)
            .await
            .unwrap();

        assert_eq!(Message::read_from(&mut b).await.unwrap(), msg);
        let pull = Message::read_from(&mut b).await.unwrap();
        assert_eq!(pull.kind(), Some(MessageType::PullRequest));
        assert!(pull.payload().is_empty());
    }

    #[tokio::test]
    async fn test_clean_close_is_connection_closed() {
        let (a, mut b) = tokio::io::duplex(64);
        drop(a);
        let err = Message::read_from(&mut b).await.unwrap_err();
        assert!(matches!(
            err,
            ChainmeshError::Network(NetworkError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_partial_header_is_malformed() {
        let (mut a, mut b) = tokio::io::duplex(64);
        a.write_all(b"N\0\0\0").await.unwrap();
        drop(a);
        let err = Message::read_from(&mut b).await.unwrap_err();
        assert!(matches!(
            err,
            ChainmeshError::Network(NetworkError::MalformedHeader { received: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_truncated_payload_is_malformed() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let mut packed = Message::new(MessageType::Chain, vec![1u8; 20]).pack();
        packed.truncate(HEADER_SIZE + 5);
        a.write_all(&packed).await.unwrap();
        drop(a);
        let err = Message::read_from(&mut b).await.unwrap_err();
        assert!(matches!(
            err,
            ChainmeshError::Network(NetworkError::MalformedMessage { .. })
        ));
        assert!(err.is_connection_fatal());
    }

    #[tokio::test]
    async fn test_oversized_length_rejected() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let mut header = vec![b'C'];
        header.extend_from_slice(&u64::MAX.to_be_bytes());
        a.write_all(&header).await.unwrap();
        let err = Message::read_from(&mut b).await.unwrap_err();
        assert!(matches!(
            err,
            ChainmeshError::Network(NetworkError::MessageTooLarge { .. })
        ));
    }
}
