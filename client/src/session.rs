//! Client session lifecycle: handshake, input submission, snapshot
//! application and graceful disconnect.

use crate::connection::ConnectionPrompt;
use crate::error::ClientError;
use crate::input::{self, InputEvent};
use crate::scene::Scene;
use log::{debug, error, info, warn};
use shared::{
    decode, encode, Delivery, DispatchError, Host, HostConfig, HostEvent, PacketDispatcher,
    PacketType, PeerId, Player, ProtocolError, TransportError, WorldState, CHANNEL_COUNT,
    DEFAULT_CHANNEL,
};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    AwaitingWelcome,
    Running,
    Disconnecting,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// How long to wait for the transport handshake.
    pub connect_timeout: Duration,
    /// How long to wait for the server's `Connect` packet afterwards.
    pub welcome_timeout: Duration,
    /// How long a graceful disconnect may take before the peer is dropped.
    pub disconnect_timeout: Duration,
    pub host: HostConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(5),
            welcome_timeout: Duration::from_secs(5),
            disconnect_timeout: Duration::from_secs(5),
            host: HostConfig::default(),
        }
    }
}

/// The part of the session that packet handlers write to.
#[derive(Debug, Default)]
pub struct LocalWorld {
    pub player_id: Option<u32>,
    pub world: WorldState,
}

fn on_welcome(local: &mut LocalWorld, player: Player) {
    local.player_id = Some(player.id);
    local.world = WorldState {
        players: vec![player],
        ..WorldState::default()
    };
}

fn on_world_state(local: &mut LocalWorld, world: WorldState) {
    local.world = world;
}

pub struct ClientSession {
    host: Host,
    server: Option<PeerId>,
    state: ClientState,
    config: ClientConfig,
    local: LocalWorld,
    dispatcher: PacketDispatcher<LocalWorld>,
}

impl ClientSession {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let host = Host::unbound(CHANNEL_COUNT)?.with_config(config.host.clone());
        Ok(Self {
            host,
            server: None,
            state: ClientState::Disconnected,
            config,
            local: LocalWorld::default(),
            dispatcher: PacketDispatcher::new(),
        })
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn player_id(&self) -> Option<u32> {
        self.local.player_id
    }

    pub fn world(&self) -> &WorldState {
        &self.local.world
    }

    pub fn is_connected(&self) -> bool {
        self.server.map_or(false, |peer| self.host.is_connected(peer))
    }

    /// Asks `prompt` for a server until a handshake succeeds. Returns the
    /// assigned player id, or `None` if the user cancelled.
    pub fn connect_with_retry<P>(&mut self, prompt: &mut P) -> Result<Option<u32>, ClientError>
    where
        P: ConnectionPrompt + ?Sized,
    {
        loop {
            let Some(target) = prompt.request() else {
                info!("Connection cancelled");
                return Ok(None);
            };

            let attempt = target
                .resolve()
                .map_err(ClientError::from)
                .and_then(|addr| self.handshake(addr));
            match attempt {
                Ok(player_id) => return Ok(Some(player_id)),
                Err(e) if e.is_retryable() => {
                    warn!("Connection to {}:{} failed: {}", target.host, target.port, e);
                    prompt.report_failure(&e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Transport connect followed by the welcome packet.
    pub fn handshake(&mut self, addr: SocketAddr) -> Result<u32, ClientError> {
        self.connect(addr)?;
        self.await_welcome()
    }

    pub fn connect(&mut self, addr: SocketAddr) -> Result<(), ClientError> {
        self.expect_state(ClientState::Disconnected)?;
        self.state = ClientState::Connecting;
        self.local = LocalWorld::default();
        info!("Connecting to {}", addr);

        let peer = match self.host.connect(addr) {
            Ok(peer) => peer,
            Err(e) => {
                self.state = ClientState::Disconnected;
                return Err(e.into());
            }
        };

        match self.wait_for_connect(peer, addr) {
            Ok(()) => {
                debug!("Transport connected to {}", addr);
                self.server = Some(peer);
                self.state = ClientState::AwaitingWelcome;
                Ok(())
            }
            Err(e) => {
                self.host.reset_peer(peer);
                self.state = ClientState::Disconnected;
                Err(e)
            }
        }
    }

    /// Blocks until the server's first packet arrives. It must be a
    /// `Connect` carrying our player; anything else ends the attempt.
    pub fn await_welcome(&mut self) -> Result<u32, ClientError> {
        self.expect_state(ClientState::AwaitingWelcome)?;
        self.dispatcher.register(PacketType::Connect, on_welcome);
        self.dispatcher.register(PacketType::WorldState, on_world_state);

        match self.receive_welcome() {
            Ok(player_id) => {
                // A second welcome mid-session is a protocol violation.
                self.dispatcher.erase(PacketType::Connect);
                self.state = ClientState::Running;
                info!("Joined as player {}", player_id);
                Ok(player_id)
            }
            Err(e) => {
                error!("Handshake failed: {}", e);
                self.abandon_server();
                Err(e)
            }
        }
    }

    /// Sends the local player's new velocity if this frame's key releases
    /// changed it. Returns whether an update went out.
    pub fn apply_input(&mut self, events: &[InputEvent]) -> Result<bool, ClientError> {
        self.expect_state(ClientState::Running)?;
        let (Some(player_id), Some(peer)) = (self.local.player_id, self.server) else {
            return Ok(false);
        };
        let Some(player) = self.local.world.find_player_mut(player_id) else {
            return Ok(false);
        };
        if !input::apply_released(events, &mut player.transform.velocity) {
            return Ok(false);
        }

        let update = *player;
        let bytes = encode(PacketType::PlayerInputUpdate, &update)?;
        self.host.send(peer, DEFAULT_CHANNEL, Delivery::ReliableOrdered, bytes)?;
        self.host.flush();
        Ok(true)
    }

    /// Applies every packet that arrived since the last call. Returns how
    /// many were applied.
    pub fn poll(&mut self) -> Result<usize, ClientError> {
        self.expect_state(ClientState::Running)?;
        let mut applied = 0;

        while let Some(event) = self.host.service(Duration::ZERO)? {
            match event {
                HostEvent::Receive { payload, .. } => {
                    match self.dispatcher.handle(&mut self.local, &payload) {
                        Ok(_) => applied += 1,
                        Err(DispatchError::Decode(e)) => warn!("Dropping malformed packet: {}", e),
                        Err(DispatchError::Protocol(e)) => {
                            error!("Protocol violation from server: {}", e);
                            self.abandon_server();
                            return Err(e.into());
                        }
                    }
                }
                HostEvent::Disconnect(peer) if Some(peer) == self.server => {
                    warn!("Server closed the connection");
                    self.server = None;
                    self.state = ClientState::Disconnected;
                    return Err(ProtocolError::ServerClosed.into());
                }
                other => debug!("Ignoring {:?}", other),
            }
        }
        Ok(applied)
    }

    /// One steady-state frame: input out, snapshots in.
    pub fn frame(&mut self, events: &[InputEvent]) -> Result<bool, ClientError> {
        let sent = self.apply_input(events)?;
        self.poll()?;
        Ok(sent)
    }

    /// Leaves the match: tells the server which player is going, then
    /// closes the transport connection and waits for its acknowledgement.
    pub fn disconnect(&mut self) -> Result<(), ClientError> {
        let Some(peer) = self.server else {
            self.state = ClientState::Disconnected;
            return Ok(());
        };
        self.state = ClientState::Disconnecting;

        if let Some(player_id) = self.local.player_id {
            let bytes = encode(PacketType::Disconnect, &player_id)?;
            if let Err(e) = self
                .host
                .send(peer, DEFAULT_CHANNEL, Delivery::ReliableOrdered, bytes)
            {
                warn!("Could not send disconnect packet: {}", e);
            }
        }
        self.host.flush();

        if let Err(e) = self.host.disconnect(peer) {
            debug!("Server peer already gone: {}", e);
        } else {
            self.wait_for_disconnect(peer)?;
        }

        self.server = None;
        self.state = ClientState::Disconnected;
        info!("Disconnected");
        Ok(())
    }

    pub fn scene(&self) -> Scene {
        Scene::build(&self.local.world, self.local.player_id)
    }

    fn expect_state(&self, expected: ClientState) -> Result<(), ClientError> {
        if self.state != expected {
            return Err(ClientError::InvalidState(self.state));
        }
        Ok(())
    }

    fn wait_for_connect(&mut self, peer: PeerId, addr: SocketAddr) -> Result<(), ClientError> {
        let deadline = Instant::now() + self.config.connect_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TransportError::ConnectTimeout(addr).into());
            }
            match self.host.service(remaining)? {
                Some(HostEvent::Connect(p)) if p == peer => return Ok(()),
                Some(HostEvent::Disconnect(p)) if p == peer => {
                    return Err(TransportError::ConnectionRefused(addr).into())
                }
                Some(other) => debug!("Ignoring {:?} while connecting", other),
                None => {}
            }
        }
    }

    fn receive_welcome(&mut self) -> Result<u32, ClientError> {
        let deadline = Instant::now() + self.config.welcome_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ProtocolError::WelcomeTimeout.into());
            }
            match self.host.service(remaining)? {
                Some(HostEvent::Receive { payload, .. }) => {
                    let (packet_type, reader) = decode(&payload)?;
                    if packet_type != PacketType::Connect {
                        return Err(ProtocolError::UnexpectedFirstPacket(packet_type).into());
                    }
                    self.dispatcher.dispatch(&mut self.local, packet_type, &reader)?;
                    return self
                        .local
                        .player_id
                        .ok_or(ClientError::InvalidState(self.state));
                }
                Some(HostEvent::Disconnect(_)) => return Err(ProtocolError::ServerClosed.into()),
                Some(HostEvent::Connect(_)) | None => {}
            }
        }
    }

    fn wait_for_disconnect(&mut self, peer: PeerId) -> Result<(), ClientError> {
        let deadline = Instant::now() + self.config.disconnect_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Server did not acknowledge disconnect, dropping connection");
                self.host.reset_peer(peer);
                return Ok(());
            }
            if let Some(HostEvent::Disconnect(p)) = self.host.service(remaining)? {
                if p == peer {
                    return Ok(());
                }
            }
        }
    }

    /// Drops the current server after a failed or aborted session.
    fn abandon_server(&mut self) {
        if let Some(peer) = self.server.take() {
            if let Err(e) = self.host.disconnect(peer) {
                debug!("Disconnect after failure: {}", e);
            }
            self.host.flush();
        }
        self.state = ClientState::Disconnected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionInfo;
    use crate::input::Key;
    use std::net::UdpSocket;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{mpsc, Arc};
    use std::thread::{self, JoinHandle};

    fn short_config() -> ClientConfig {
        ClientConfig {
            connect_timeout: Duration::from_millis(300),
            welcome_timeout: Duration::from_millis(300),
            disconnect_timeout: Duration::from_millis(500),
            ..ClientConfig::default()
        }
    }

    struct FakeServer {
        addr: SocketAddr,
        stop: Arc<AtomicBool>,
        handle: JoinHandle<()>,
    }

    impl FakeServer {
        /// Accepts connections and greets each one with `greeting`, if any.
        fn start(greeting: Option<Vec<u8>>) -> Self {
            let stop = Arc::new(AtomicBool::new(false));
            let (tx, rx) = mpsc::channel();
            let flag = Arc::clone(&stop);

            let handle = thread::spawn(move || {
                let mut host = Host::bind("127.0.0.1:0", 4, CHANNEL_COUNT).unwrap();
                tx.send(host.local_addr()).unwrap();
                while !flag.load(Ordering::SeqCst) {
                    if let Some(HostEvent::Connect(peer)) =
                        host.service(Duration::from_millis(5)).unwrap()
                    {
                        if let Some(bytes) = &greeting {
                            let bytes = bytes.to_vec();
                            host.send(peer, DEFAULT_CHANNEL, Delivery::ReliableOrdered, bytes)
                                .unwrap();
                        }
                    }
                }
            });

            let addr = rx.recv().unwrap();
            Self { addr, stop, handle }
        }

        fn stop(self) {
            self.stop.store(true, Ordering::SeqCst);
            self.handle.join().unwrap();
        }
    }

    /// Hands out a fixed list of targets and counts reported failures.
    struct ScriptedPrompt {
        targets: Vec<Option<ConnectionInfo>>,
        failures: usize,
    }

    impl ConnectionPrompt for ScriptedPrompt {
        fn request(&mut self) -> Option<ConnectionInfo> {
            if self.targets.is_empty() {
                return None;
            }
            self.targets.remove(0)
        }

        fn report_failure(&mut self, _error: &ClientError) {
            self.failures += 1;
        }
    }

    #[test]
    fn test_failed_attempts_retry_until_cancelled() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = silent.local_addr().unwrap().port();
        let mut prompt = ScriptedPrompt {
            targets: vec![
                Some(ConnectionInfo::new("", 5000, "tester")),
                Some(ConnectionInfo::new("127.0.0.1", port, "tester")),
                None,
                Some(ConnectionInfo::new("127.0.0.1", port, "tester")),
            ],
            failures: 0,
        };
        let mut session = ClientSession::new(short_config()).unwrap();

        assert!(matches!(session.connect_with_retry(&mut prompt), Ok(None)));
        assert_eq!(prompt.failures, 2);
        // Cancelling stops the loop; the last target is never tried.
        assert_eq!(prompt.targets.len(), 1);
        assert_eq!(session.state(), ClientState::Disconnected);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_new_session_is_disconnected() {
        let session = ClientSession::new(ClientConfig::default()).unwrap();
        assert_eq!(session.state(), ClientState::Disconnected);
        assert_eq!(session.player_id(), None);
        assert!(!session.is_connected());
    }

    #[test]
    fn test_steady_state_calls_require_running() {
        let mut session = ClientSession::new(ClientConfig::default()).unwrap();
        assert!(matches!(
            session.poll(),
            Err(ClientError::InvalidState(ClientState::Disconnected))
        ));
        assert!(matches!(
            session.apply_input(&[InputEvent::released(Key::W)]),
            Err(ClientError::InvalidState(ClientState::Disconnected))
        ));
        assert!(matches!(
            session.await_welcome(),
            Err(ClientError::InvalidState(ClientState::Disconnected))
        ));
    }

    #[test]
    fn test_connect_times_out_against_silent_socket() {
        let silent = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = silent.local_addr().unwrap();
        let mut session = ClientSession::new(short_config()).unwrap();

        match session.connect(addr) {
            Err(ClientError::Transport(TransportError::ConnectTimeout(a))) => assert_eq!(a, addr),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(session.state(), ClientState::Disconnected);
    }

    #[test]
    fn test_welcome_timeout() {
        let server = FakeServer::start(None);
        let mut session = ClientSession::new(short_config()).unwrap();

        session.connect(server.addr).unwrap();
        assert_eq!(session.state(), ClientState::AwaitingWelcome);
        assert!(matches!(
            session.await_welcome(),
            Err(ClientError::Protocol(ProtocolError::WelcomeTimeout))
        ));
        assert_eq!(session.state(), ClientState::Disconnected);
        server.stop();
    }

    #[test]
    fn test_unexpected_first_packet() {
        let greeting = encode(PacketType::WorldState, &WorldState::new()).unwrap();
        let server = FakeServer::start(Some(greeting));
        let mut session = ClientSession::new(short_config()).unwrap();

        match session.handshake(server.addr) {
            Err(ClientError::Protocol(ProtocolError::UnexpectedFirstPacket(t))) => {
                assert_eq!(t, PacketType::WorldState)
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(session.state(), ClientState::Disconnected);
        server.stop();
    }

    #[test]
    fn test_welcome_seeds_local_world() {
        let mut player = Player::new(3);
        player.transform.pos = shared::Vector2::new(0.1, 0.5);
        let greeting = encode(PacketType::Connect, &player).unwrap();
        let server = FakeServer::start(Some(greeting));
        let mut session = ClientSession::new(short_config()).unwrap();

        assert_eq!(session.handshake(server.addr).unwrap(), 3);
        assert_eq!(session.state(), ClientState::Running);
        assert_eq!(session.player_id(), Some(3));
        assert_eq!(session.world().players, vec![player]);

        // A key release goes out as an input update.
        assert!(session.apply_input(&[InputEvent::released(Key::D)]).unwrap());
        assert_eq!(
            session.world().players[0].transform.velocity,
            shared::Vector2::new(1.0, 0.0)
        );

        session.disconnect().unwrap();
        assert_eq!(session.state(), ClientState::Disconnected);
        server.stop();
    }
}
