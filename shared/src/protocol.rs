//! Application packet tags and the channel layout shared by both ends.

use crate::error::DecodeError;

/// Default logical channel. Every control and state packet travels here.
pub const DEFAULT_CHANNEL: u8 = 0;
/// Reserved, unused by the game protocol.
pub const RESERVED_CHANNEL: u8 = 1;
pub const CHANNEL_COUNT: u8 = 2;

pub const DEFAULT_PORT: u16 = 5000;
pub const MAX_PLAYERS: usize = 10;

/// Single-byte tag at the head of every application packet.
///
/// Payloads per tag:
/// - `Connect`: server to new client, the admitted `Player`
/// - `Disconnect`: either direction, a bare `u32` player id
/// - `PlayerInputUpdate`: client to server, a `Player` whose velocity is the intent
/// - `WorldState`: server to all, the whole `WorldState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PacketType {
    Connect = 0,
    Disconnect = 1,
    PlayerInputUpdate = 2,
    WorldState = 3,
}

impl PacketType {
    pub const ALL: [PacketType; 4] = [
        PacketType::Connect,
        PacketType::Disconnect,
        PacketType::PlayerInputUpdate,
        PacketType::WorldState,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for PacketType {
    type Error = DecodeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(PacketType::Connect),
            1 => Ok(PacketType::Disconnect),
            2 => Ok(PacketType::PlayerInputUpdate),
            3 => Ok(PacketType::WorldState),
            other => Err(DecodeError::UnknownTag(other)),
        }
    }
}
