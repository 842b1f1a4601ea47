//! # Shared Arena Protocol
//!
//! Everything both ends of the arena agree on: the replicated world model,
//! the wire codec and packet tags, the tag-keyed dispatcher and the UDP
//! transport with reliable-ordered channels.
//!
//! ## Wire format
//!
//! An application packet is one tag byte ([`protocol::PacketType`])
//! followed by the bincode encoding of its payload, fields in declaration
//! order. Packets travel inside transport frames; see [`transport`].
//!
//! ## Consistency model
//!
//! The server is the only writer of [`world::WorldState`]. Clients send
//! intent (a velocity) and replace their local world wholesale with every
//! snapshot they receive. Snapshots carry no sequence number, so a late
//! snapshot simply overwrites a newer one; reliable-ordered delivery on a
//! single channel keeps that from happening in practice.

pub mod codec;
pub mod dispatch;
pub mod error;
pub mod math;
pub mod protocol;
pub mod transport;
pub mod world;

pub use codec::{decode, encode, PayloadReader};
pub use dispatch::PacketDispatcher;
pub use error::{DecodeError, DispatchError, ProtocolError, TransportError};
pub use math::Vector2;
pub use protocol::{PacketType, CHANNEL_COUNT, DEFAULT_CHANNEL, DEFAULT_PORT, MAX_PLAYERS};
pub use transport::{Delivery, Host, HostConfig, HostEvent, PeerId, PeerState};
pub use world::{MoveableObject, Player, Puck, Span, WorldState};
