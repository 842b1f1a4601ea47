//! Per-peer, per-channel reliable-ordered bookkeeping.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// How far ahead of the next expected sequence we are willing to hold.
const MAX_HELD_AHEAD: u32 = 1024;

#[derive(Debug)]
struct InFlight {
    payload: Vec<u8>,
    last_sent: Instant,
}

#[derive(Debug, Default)]
pub struct ChannelState {
    next_outgoing: u32,
    in_flight: BTreeMap<u32, InFlight>,
    next_incoming: u32,
    held: BTreeMap<u32, Vec<u8>>,
}

impl ChannelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the next sequence to `payload` and keeps a copy until acked.
    pub fn push_outgoing(&mut self, payload: Vec<u8>, now: Instant) -> u32 {
        let sequence = self.next_outgoing;
        self.next_outgoing += 1;
        self.in_flight.insert(
            sequence,
            InFlight {
                payload,
                last_sent: now,
            },
        );
        sequence
    }

    pub fn acknowledge(&mut self, sequence: u32) -> bool {
        self.in_flight.remove(&sequence).is_some()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Payloads whose last transmission is older than `interval`, oldest first.
    pub fn due_for_resend(&mut self, now: Instant, interval: Duration) -> Vec<(u32, Vec<u8>)> {
        self.in_flight
            .iter_mut()
            .filter(|(_, pending)| now.duration_since(pending.last_sent) >= interval)
            .map(|(&sequence, pending)| {
                pending.last_sent = now;
                (sequence, pending.payload.clone())
            })
            .collect()
    }

    /// Accepts an incoming reliable payload and returns everything that is
    /// now deliverable in order. Duplicates and stale sequences yield nothing.
    pub fn receive(&mut self, sequence: u32, payload: Vec<u8>) -> Vec<Vec<u8>> {
        if sequence < self.next_incoming
            || sequence - self.next_incoming > MAX_HELD_AHEAD
        {
            return Vec::new();
        }

        self.held.entry(sequence).or_insert(payload);

        let mut ready = Vec::new();
        while let Some(payload) = self.held.remove(&self.next_incoming) {
            ready.push(payload);
            self.next_incoming += 1;
        }
        ready
    }
}
