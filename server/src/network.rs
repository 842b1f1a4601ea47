//! Server network layer: admission, packet handling and the tick loop

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::game::{self, GameState};
use crate::spawn::Spawner;
use log::{debug, error, info, warn};
use shared::{
    encode, DispatchError, Delivery, Host, HostEvent, PacketDispatcher, PacketType, PeerId,
    TransportError, WorldState, CHANNEL_COUNT, DEFAULT_CHANNEL,
};
use std::net::SocketAddr;
use std::time::Duration;

/// Main server coordinating networking and game simulation
pub struct Server {
    host: Host,
    clients: ClientManager,
    game_state: GameState,
    dispatcher: PacketDispatcher<GameState>,
    tick_duration: Duration,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, TransportError> {
        let host = Host::bind(config.bind_addr.as_str(), config.max_players, CHANNEL_COUNT)?
            .with_config(config.host.clone());

        let spawner = match config.seed {
            Some(seed) => Spawner::seeded(seed),
            None => Spawner::from_entropy(),
        };

        let mut dispatcher = PacketDispatcher::new();
        dispatcher.register(PacketType::PlayerInputUpdate, game::on_player_input);
        dispatcher.register(PacketType::Disconnect, game::on_disconnect);

        Ok(Server {
            host,
            clients: ClientManager::new(config.max_players),
            game_state: GameState::new(spawner),
            dispatcher,
            tick_duration: config.tick_duration,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.host.local_addr()
    }

    pub fn world(&self) -> &WorldState {
        &self.game_state.world
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    /// Drains every pending transport event without blocking.
    pub fn poll_network(&mut self) -> Result<(), TransportError> {
        while let Some(event) = self.host.service(Duration::ZERO)? {
            match event {
                HostEvent::Connect(peer) => self.admit(peer),
                HostEvent::Receive { peer, payload, .. } => self.handle_packet(peer, &payload),
                HostEvent::Disconnect(peer) => self.evict(peer),
            }
        }
        Ok(())
    }

    /// Advances the simulation one tick and broadcasts the result.
    pub fn tick(&mut self) {
        self.game_state.step();
        self.broadcast_world();
    }

    /// One iteration of the main loop.
    pub fn update(&mut self) -> Result<(), TransportError> {
        self.poll_network()?;
        self.tick();
        Ok(())
    }

    /// Runs until Ctrl+C.
    pub async fn run(&mut self) -> Result<(), TransportError> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down");
        })
        .await
    }

    /// Ticks until `shutdown` completes, then disconnects every client.
    /// The future is polled across ticks, so a signal raised while a tick
    /// is running ends the loop at the next wait.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), TransportError>
    where
        F: std::future::Future<Output = ()>,
    {
        info!("Server started successfully");
        tokio::pin!(shutdown);

        loop {
            self.update()?;

            if self.game_state.tick % 1000 == 0 && !self.clients.is_empty() {
                debug!(
                    "Tick {}: {} clients, score {}",
                    self.game_state.tick,
                    self.clients.len(),
                    self.game_state.world.score_label()
                );
            }

            tokio::select! {
                _ = tokio::time::sleep(self.tick_duration) => {}
                _ = &mut shutdown => break,
            }
        }

        self.shutdown();
        Ok(())
    }

    fn admit(&mut self, peer: PeerId) {
        let Some(player_id) = self.clients.add_client(peer) else {
            warn!("No room for peer {:?}, disconnecting", peer);
            self.disconnect_peer(peer);
            return;
        };

        let player = self.game_state.admit_player(player_id);
        match encode(PacketType::Connect, &player) {
            Ok(bytes) => {
                if let Err(e) = self
                    .host
                    .send(peer, DEFAULT_CHANNEL, Delivery::ReliableOrdered, bytes)
                {
                    error!("Failed to welcome player {}: {}", player_id, e);
                }
            }
            Err(e) => error!("Failed to encode welcome for player {}: {}", player_id, e),
        }
        self.host.flush();
    }

    fn handle_packet(&mut self, peer: PeerId, payload: &[u8]) {
        match self.dispatcher.handle(&mut self.game_state, payload) {
            Ok(packet_type) => debug!("Handled {:?} from {:?}", packet_type, peer),
            Err(DispatchError::Decode(e)) => {
                warn!(
                    "Dropping malformed packet from {:?} (player {:?}): {}",
                    peer,
                    self.clients.player_for(peer),
                    e
                );
            }
            Err(DispatchError::Protocol(e)) => {
                error!(
                    "Protocol violation from {:?} (player {:?}): {}, evicting",
                    peer,
                    self.clients.player_for(peer),
                    e
                );
                self.disconnect_peer(peer);
                self.evict(peer);
            }
        }
    }

    fn evict(&mut self, peer: PeerId) {
        if let Some(player_id) = self.clients.remove_client(peer) {
            self.game_state.remove_player(player_id);
        }
    }

    fn disconnect_peer(&mut self, peer: PeerId) {
        if let Err(e) = self.host.disconnect(peer) {
            debug!("Disconnect of {:?} failed: {}", peer, e);
        }
    }

    fn broadcast_world(&mut self) {
        if self.clients.is_empty() {
            return;
        }

        match encode(PacketType::WorldState, &self.game_state.world) {
            Ok(bytes) => {
                if let Err(e) =
                    self.host
                        .broadcast(DEFAULT_CHANNEL, Delivery::ReliableOrdered, &bytes)
                {
                    error!("Failed to broadcast world state: {}", e);
                }
            }
            Err(e) => error!("Failed to encode world state: {}", e),
        }
        self.host.flush();
    }

    fn shutdown(&mut self) {
        for peer in self.clients.peers() {
            self.disconnect_peer(peer);
        }
        self.host.flush();
    }
}
