//! Peer-to-player bookkeeping for the server
//!
//! Every live transport peer owns exactly one player while it is connected.
//! This module hands out player ids and tracks which peer a player belongs to:
//! - Ids start at 0 and only ever grow, so they are never reused within a
//!   server process, even after the player leaves
//! - Capacity is enforced here as well as in the transport host
//! - Connection times are kept for the disconnect log line

use log::info;
use shared::PeerId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A connected peer and the player it controls
#[derive(Debug)]
pub struct Client {
    /// Player id assigned on admission
    pub player_id: u32,
    /// Transport handle used to address replies
    pub peer: PeerId,
    /// When the peer was admitted
    pub connected_at: Instant,
}

impl Client {
    pub fn new(player_id: u32, peer: PeerId) -> Self {
        Self {
            player_id,
            peer,
            connected_at: Instant::now(),
        }
    }

    pub fn session_length(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Tracks admitted peers and allocates monotonic player ids
pub struct ClientManager {
    /// Connected clients indexed by transport peer
    clients: HashMap<PeerId, Client>,
    /// Id handed to the next admitted player
    next_player_id: u32,
    /// Maximum number of concurrent clients allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_player_id: 0,
            max_clients,
        }
    }

    /// Admits `peer` and returns its new player id, or `None` when the
    /// server is full or the peer is already admitted.
    pub fn add_client(&mut self, peer: PeerId) -> Option<u32> {
        if self.clients.len() >= self.max_clients || self.clients.contains_key(&peer) {
            return None;
        }

        let player_id = self.next_player_id;
        self.next_player_id += 1;

        info!("Peer {:?} admitted as player {}", peer, player_id);
        self.clients.insert(peer, Client::new(player_id, peer));
        Some(player_id)
    }

    /// Forgets `peer` and returns the player it controlled.
    pub fn remove_client(&mut self, peer: PeerId) -> Option<u32> {
        let client = self.clients.remove(&peer)?;
        info!(
            "Player {} (peer {:?}) left after {:.1}s",
            client.player_id,
            peer,
            client.session_length().as_secs_f32()
        );
        Some(client.player_id)
    }

    pub fn player_for(&self, peer: PeerId) -> Option<u32> {
        self.clients.get(&peer).map(|c| c.player_id)
    }

    pub fn peers(&self) -> Vec<PeerId> {
        self.clients.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
