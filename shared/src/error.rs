use crate::protocol::PacketType;
use crate::transport::PeerId;
use std::net::SocketAddr;
use thiserror::Error;

/// Malformed bytes. Isolated to the offending packet; callers drop it.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet tag {0}")]
    UnknownTag(u8),
    #[error("malformed payload: {0}")]
    Payload(#[from] bincode::Error),
}

/// Violations of the session contract. Fatal for the session that sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("no handler registered for packet type {0:?}")]
    UnhandledPacketType(PacketType),
    #[error("expected a Connect packet first, got {0:?}")]
    UnexpectedFirstPacket(PacketType),
    #[error("server did not send a welcome packet in time")]
    WelcomeTimeout,
    #[error("server closed the connection")]
    ServerClosed,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("frame encoding failed: {0}")]
    Frame(#[from] bincode::Error),
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("unknown peer {0:?}")]
    UnknownPeer(PeerId),
    #[error("channel {channel} out of range ({count} channels)")]
    InvalidChannel { channel: u8, count: u8 },
    #[error("connection to {0} timed out")]
    ConnectTimeout(SocketAddr),
    #[error("connection refused by {0}")]
    ConnectionRefused(SocketAddr),
    #[error("peer {0:?} is not connected")]
    NotConnected(PeerId),
}
