use serde::{Deserialize, Serialize};

pub const PROTOCOL_MAGIC: u32 = 0x5055_434B;

/// One UDP datagram on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub magic: u32,
    pub kind: FrameKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FrameKind {
    Connect,
    ConnectAck,
    Refused,
    Disconnect,
    DisconnectAck,
    Ping,
    Ack {
        channel: u8,
        sequence: u32,
    },
    Reliable {
        channel: u8,
        sequence: u32,
        payload: Vec<u8>,
    },
    Unreliable {
        channel: u8,
        payload: Vec<u8>,
    },
}

impl Frame {
    pub fn new(kind: FrameKind) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            kind,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Returns `None` for undecodable datagrams or a foreign magic.
    pub fn from_bytes(bytes: &[u8]) -> Option<Frame> {
        let frame: Frame = bincode::deserialize(bytes).ok()?;
        (frame.magic == PROTOCOL_MAGIC).then_some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::new(FrameKind::Reliable {
            channel: 1,
            sequence: 77,
            payload: vec![3, 1, 4],
        });
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(Frame::from_bytes(&bytes), Some(frame));
    }

    #[test]
    fn test_foreign_magic_rejected() {
        let mut frame = Frame::new(FrameKind::Ping);
        frame.magic = 0xDEAD_BEEF;
        let bytes = frame.to_bytes().unwrap();
        assert_eq!(Frame::from_bytes(&bytes), None);
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(Frame::from_bytes(&[]), None);
        assert_eq!(Frame::from_bytes(&[0xFF; 3]), None);
    }
}
