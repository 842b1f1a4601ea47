//! Wire codec: one tag byte followed by the bincode encoding of the payload.
//!
//! Decoding happens in two phases. [`decode`] only reads the tag and hands
//! back a [`PayloadReader`]; whoever knows the concrete payload type for that
//! tag (normally a dispatcher handler) then calls [`PayloadReader::read`].

use crate::error::DecodeError;
use crate::protocol::PacketType;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize + ?Sized>(
    packet_type: PacketType,
    payload: &T,
) -> Result<Vec<u8>, bincode::Error> {
    let size = bincode::serialized_size(payload)? as usize;
    let mut bytes = Vec::with_capacity(1 + size);
    bytes.push(packet_type.tag());
    bincode::serialize_into(&mut bytes, payload)?;
    Ok(bytes)
}

pub fn decode(bytes: &[u8]) -> Result<(PacketType, PayloadReader<'_>), DecodeError> {
    let (&tag, rest) = bytes.split_first().ok_or(DecodeError::Empty)?;
    let packet_type = PacketType::try_from(tag)?;
    Ok((packet_type, PayloadReader { bytes: rest }))
}

/// Payload bytes positioned right after the tag.
#[derive(Debug, Clone, Copy)]
pub struct PayloadReader<'a> {
    bytes: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    pub fn read<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        Ok(bincode::deserialize(self.bytes)?)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
