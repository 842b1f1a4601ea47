//! Connection-oriented transport over UDP.
//!
//! A [`Host`] owns one non-blocking socket and any number of peers. Every
//! peer has a fixed set of logical channels; each channel carries
//! reliable-ordered traffic (sequenced, acked, retransmitted) and
//! unreliable traffic side by side. The host never blocks except inside
//! [`Host::service`] with a non-zero timeout.

mod channel;
mod frame;
mod host;

pub use channel::ChannelState;
pub use frame::{Frame, FrameKind, PROTOCOL_MAGIC};
pub use host::Host;

use std::time::Duration;

/// Host-local handle of a remote endpoint. Never reused within a host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    ReliableOrdered,
    Unreliable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Connecting,
    Connected,
    Disconnecting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Connect(PeerId),
    Disconnect(PeerId),
    Receive {
        peer: PeerId,
        channel: u8,
        payload: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Retransmission period for unacked reliable frames and handshakes.
    pub resend_interval: Duration,
    /// Idle period after which a ping is sent to keep the peer alive.
    pub keepalive_interval: Duration,
    /// Silence after which a peer is considered gone.
    pub peer_timeout: Duration,
    /// How long a graceful disconnect waits for the remote acknowledgement.
    pub disconnect_grace: Duration,
    /// Sleep between socket polls inside a blocking `service` call.
    pub poll_interval: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            resend_interval: Duration::from_millis(100),
            keepalive_interval: Duration::from_millis(500),
            peer_timeout: Duration::from_secs(10),
            disconnect_grace: Duration::from_secs(3),
            poll_interval: Duration::from_millis(1),
        }
    }
}
