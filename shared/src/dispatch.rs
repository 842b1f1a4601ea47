//! Tag-keyed handler registry.
//!
//! Handlers are plain functions that receive the state they mutate as an
//! explicit `&mut C` argument, so nothing is captured from the surroundings.
//! Callbacks run synchronously on the caller's thread, one packet at a time.

use crate::codec::{self, PayloadReader};
use crate::error::{DecodeError, DispatchError, ProtocolError};
use crate::protocol::PacketType;
use log::trace;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

type Handler<C> = Box<dyn Fn(&mut C, &PayloadReader<'_>) -> Result<(), DecodeError>>;

pub struct PacketDispatcher<C> {
    handlers: HashMap<PacketType, Handler<C>>,
}

impl<C> PacketDispatcher<C> {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Binds `callback` to `packet_type`. A later registration for the same
    /// tag replaces the earlier one.
    pub fn register<T>(&mut self, packet_type: PacketType, callback: fn(&mut C, T))
    where
        C: 'static,
        T: DeserializeOwned + 'static,
    {
        let handler: Handler<C> = Box::new(move |ctx: &mut C, reader: &PayloadReader<'_>| {
            let payload: T = reader.read()?;
            callback(ctx, payload);
            Ok(())
        });
        self.handlers.insert(packet_type, handler);
    }

    pub fn erase(&mut self, packet_type: PacketType) {
        self.handlers.remove(&packet_type);
    }

    pub fn is_registered(&self, packet_type: PacketType) -> bool {
        self.handlers.contains_key(&packet_type)
    }

    pub fn dispatch(
        &self,
        ctx: &mut C,
        packet_type: PacketType,
        reader: &PayloadReader<'_>,
    ) -> Result<(), DispatchError> {
        let handler = self
            .handlers
            .get(&packet_type)
            .ok_or(ProtocolError::UnhandledPacketType(packet_type))?;
        trace!("Dispatching {:?} ({} bytes)", packet_type, reader.len());
        handler(ctx, reader)?;
        Ok(())
    }

    /// Decodes the tag of a raw packet and dispatches it.
    pub fn handle(&self, ctx: &mut C, bytes: &[u8]) -> Result<PacketType, DispatchError> {
        let (packet_type, reader) = codec::decode(bytes)?;
        self.dispatch(ctx, packet_type, &reader)?;
        Ok(packet_type)
    }
}

impl<C> Default for PacketDispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}
