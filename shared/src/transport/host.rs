use super::channel::ChannelState;
use super::frame::{Frame, FrameKind};
use super::{Delivery, HostConfig, HostEvent, PeerId, PeerState};
use crate::error::TransportError;
use log::{debug, info, trace, warn};
use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::thread;
use std::time::{Duration, Instant};

const RECV_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug)]
struct Peer {
    id: PeerId,
    addr: SocketAddr,
    state: PeerState,
    channels: Vec<ChannelState>,
    last_receive: Instant,
    last_send: Instant,
    state_since: Instant,
}

impl Peer {
    fn new(id: PeerId, addr: SocketAddr, state: PeerState, channel_count: u8, now: Instant) -> Self {
        Self {
            id,
            addr,
            state,
            channels: (0..channel_count).map(|_| ChannelState::new()).collect(),
            last_receive: now,
            last_send: now,
            state_since: now,
        }
    }

    fn enter(&mut self, state: PeerState, now: Instant) {
        self.state = state;
        self.state_since = now;
    }
}

/// One network endpoint: a bound UDP socket plus its peers.
pub struct Host {
    socket: UdpSocket,
    local_addr: SocketAddr,
    config: HostConfig,
    max_peers: usize,
    channel_count: u8,
    accepts_incoming: bool,
    peers: HashMap<PeerId, Peer>,
    peers_by_addr: HashMap<SocketAddr, PeerId>,
    next_peer_id: u32,
    outgoing: VecDeque<(SocketAddr, Vec<u8>)>,
    events: VecDeque<HostEvent>,
    recv_buffer: Vec<u8>,
}

impl Host {
    /// Creates a listening host that admits up to `max_peers` remote peers.
    pub fn bind<A: ToSocketAddrs>(
        addr: A,
        max_peers: usize,
        channel_count: u8,
    ) -> Result<Self, TransportError> {
        let host = Self::open(addr, max_peers, channel_count, true)?;
        info!("Host listening on {}", host.local_addr);
        Ok(host)
    }

    /// Creates a host on an ephemeral port that only makes outgoing connections.
    pub fn unbound(channel_count: u8) -> Result<Self, TransportError> {
        Self::open("0.0.0.0:0", 1, channel_count, false)
    }

    fn open<A: ToSocketAddrs>(
        addr: A,
        max_peers: usize,
        channel_count: u8,
        accepts_incoming: bool,
    ) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            config: HostConfig::default(),
            max_peers,
            channel_count,
            accepts_incoming,
            peers: HashMap::new(),
            peers_by_addr: HashMap::new(),
            next_peer_id: 0,
            outgoing: VecDeque::new(),
            events: VecDeque::new(),
            recv_buffer: vec![0u8; RECV_BUFFER_SIZE],
        })
    }

    pub fn with_config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn channel_count(&self) -> u8 {
        self.channel_count
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    pub fn peer_state(&self, peer: PeerId) -> Option<PeerState> {
        self.peers.get(&peer).map(|p| p.state)
    }

    pub fn is_connected(&self, peer: PeerId) -> bool {
        self.peer_state(peer) == Some(PeerState::Connected)
    }

    /// Starts a handshake with `addr`. Completion is reported by a
    /// `HostEvent::Connect` from `service`; refusal by `HostEvent::Disconnect`.
    pub fn connect(&mut self, addr: SocketAddr) -> Result<PeerId, TransportError> {
        if let Some(existing) = self.peers_by_addr.get(&addr).copied() {
            debug!("Replacing stale peer {:?} for {}", existing, addr);
            self.remove_peer(existing);
        }

        let now = Instant::now();
        let id = self.allocate_peer(addr, PeerState::Connecting, now);
        queue_frame(&mut self.outgoing, addr, FrameKind::Connect);
        debug!("Connecting to {} as {:?}", addr, id);
        Ok(id)
    }

    pub fn send(
        &mut self,
        peer: PeerId,
        channel: u8,
        delivery: Delivery,
        payload: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.check_channel(channel)?;
        let now = Instant::now();
        let peer_entry = self
            .peers
            .get_mut(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;
        if peer_entry.state != PeerState::Connected {
            return Err(TransportError::NotConnected(peer));
        }

        let kind = match delivery {
            Delivery::ReliableOrdered => {
                let sequence =
                    peer_entry.channels[channel as usize].push_outgoing(payload.clone(), now);
                FrameKind::Reliable {
                    channel,
                    sequence,
                    payload,
                }
            }
            Delivery::Unreliable => FrameKind::Unreliable { channel, payload },
        };
        peer_entry.last_send = now;
        queue_frame(&mut self.outgoing, peer_entry.addr, kind);
        Ok(())
    }

    /// Sends `payload` to every connected peer.
    pub fn broadcast(
        &mut self,
        channel: u8,
        delivery: Delivery,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        self.check_channel(channel)?;
        let targets: Vec<PeerId> = self
            .peers
            .values()
            .filter(|p| p.state == PeerState::Connected)
            .map(|p| p.id)
            .collect();

        for peer in targets {
            self.send(peer, channel, delivery, payload.to_vec())?;
        }
        Ok(())
    }

    /// Writes every queued datagram to the socket.
    pub fn flush(&mut self) {
        while let Some((addr, bytes)) = self.outgoing.pop_front() {
            match self.socket.send_to(&bytes, addr) {
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    trace!("Socket busy, dropping datagram to {}", addr);
                }
                Err(e) => debug!("Failed to send to {}: {}", addr, e),
            }
        }
    }

    /// Begins a graceful disconnect. The peer is released once the remote
    /// acknowledges or the grace period runs out; either way a
    /// `HostEvent::Disconnect` follows.
    pub fn disconnect(&mut self, peer: PeerId) -> Result<(), TransportError> {
        let now = Instant::now();
        let entry = self
            .peers
            .get_mut(&peer)
            .ok_or(TransportError::UnknownPeer(peer))?;

        match entry.state {
            PeerState::Connecting => {
                self.remove_peer(peer);
                self.events.push_back(HostEvent::Disconnect(peer));
            }
            PeerState::Connected => {
                entry.enter(PeerState::Disconnecting, now);
                entry.last_send = now;
                queue_frame(&mut self.outgoing, entry.addr, FrameKind::Disconnect);
            }
            PeerState::Disconnecting => {}
        }
        Ok(())
    }

    /// Drops a peer immediately without notifying the remote side.
    pub fn reset_peer(&mut self, peer: PeerId) {
        if self.remove_peer(peer).is_some() {
            debug!("Peer {:?} reset", peer);
        }
    }

    /// Pumps the socket and returns the next event, waiting at most `timeout`.
    /// A zero timeout never sleeps.
    pub fn service(&mut self, timeout: Duration) -> Result<Option<HostEvent>, TransportError> {
        let deadline = Instant::now() + timeout;

        loop {
            self.flush();
            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }

            self.receive()?;
            self.maintain(Instant::now());
            self.flush();

            if let Some(event) = self.events.pop_front() {
                return Ok(Some(event));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(self.config.poll_interval.min(deadline - now));
        }
    }

    fn check_channel(&self, channel: u8) -> Result<(), TransportError> {
        if channel >= self.channel_count {
            return Err(TransportError::InvalidChannel {
                channel,
                count: self.channel_count,
            });
        }
        Ok(())
    }

    fn allocate_peer(&mut self, addr: SocketAddr, state: PeerState, now: Instant) -> PeerId {
        let id = PeerId(self.next_peer_id);
        self.next_peer_id += 1;
        self.peers
            .insert(id, Peer::new(id, addr, state, self.channel_count, now));
        self.peers_by_addr.insert(addr, id);
        id
    }

    fn remove_peer(&mut self, peer: PeerId) -> Option<SocketAddr> {
        let removed = self.peers.remove(&peer)?;
        self.peers_by_addr.remove(&removed.addr);
        Some(removed.addr)
    }

    fn receive(&mut self) -> Result<(), TransportError> {
        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((len, addr)) => {
                    let frame = Frame::from_bytes(&self.recv_buffer[..len]);
                    match frame {
                        Some(frame) => self.handle_frame(addr, frame.kind, Instant::now()),
                        None => {
                            debug!("Dropping malformed datagram from {} ({} bytes)", addr, len)
                        }
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                // ICMP feedback from an earlier send; not fatal for the host.
                Err(e)
                    if matches!(
                        e.kind(),
                        io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
                    ) =>
                {
                    trace!("Ignoring socket feedback: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn handle_frame(&mut self, addr: SocketAddr, kind: FrameKind, now: Instant) {
        let Some(peer_id) = self.peers_by_addr.get(&addr).copied() else {
            if kind == FrameKind::Connect {
                self.accept(addr, now);
            } else if kind == FrameKind::Disconnect {
                // Already dropped on our side; release the remote right away.
                debug!("Acknowledging disconnect from unknown {}", addr);
                queue_frame(&mut self.outgoing, addr, FrameKind::DisconnectAck);
            } else {
                trace!("Ignoring {:?} from unknown {}", kind, addr);
            }
            return;
        };

        let Some(peer) = self.peers.get_mut(&peer_id) else {
            return;
        };
        peer.last_receive = now;

        match kind {
            FrameKind::Connect => {
                if peer.state == PeerState::Connected {
                    queue_frame(&mut self.outgoing, addr, FrameKind::ConnectAck);
                }
            }
            FrameKind::ConnectAck => {
                if peer.state == PeerState::Connecting {
                    peer.enter(PeerState::Connected, now);
                    self.events.push_back(HostEvent::Connect(peer_id));
                }
            }
            FrameKind::Refused => {
                if peer.state == PeerState::Connecting {
                    warn!("Connection refused by {}", addr);
                    self.remove_peer(peer_id);
                    self.events.push_back(HostEvent::Disconnect(peer_id));
                }
            }
            FrameKind::Disconnect => {
                queue_frame(&mut self.outgoing, addr, FrameKind::DisconnectAck);
                self.remove_peer(peer_id);
                self.events.push_back(HostEvent::Disconnect(peer_id));
            }
            FrameKind::DisconnectAck => {
                if peer.state == PeerState::Disconnecting {
                    self.remove_peer(peer_id);
                    self.events.push_back(HostEvent::Disconnect(peer_id));
                }
            }
            FrameKind::Ping => {}
            FrameKind::Ack { channel, sequence } => {
                if let Some(state) = peer.channels.get_mut(channel as usize) {
                    state.acknowledge(sequence);
                }
            }
            FrameKind::Reliable {
                channel,
                sequence,
                payload,
            } => {
                if peer.state != PeerState::Connected {
                    return;
                }
                let Some(state) = peer.channels.get_mut(channel as usize) else {
                    debug!("Reliable frame on invalid channel {} from {}", channel, addr);
                    return;
                };
                queue_frame(&mut self.outgoing, addr, FrameKind::Ack { channel, sequence });
                for payload in state.receive(sequence, payload) {
                    self.events.push_back(HostEvent::Receive {
                        peer: peer_id,
                        channel,
                        payload,
                    });
                }
            }
            FrameKind::Unreliable { channel, payload } => {
                if peer.state == PeerState::Connected && channel < self.channel_count {
                    self.events.push_back(HostEvent::Receive {
                        peer: peer_id,
                        channel,
                        payload,
                    });
                }
            }
        }
    }

    fn accept(&mut self, addr: SocketAddr, now: Instant) {
        if !self.accepts_incoming || self.peers.len() >= self.max_peers {
            info!("Refusing connection from {} ({} peers)", addr, self.peers.len());
            queue_frame(&mut self.outgoing, addr, FrameKind::Refused);
            return;
        }

        let id = self.allocate_peer(addr, PeerState::Connected, now);
        queue_frame(&mut self.outgoing, addr, FrameKind::ConnectAck);
        self.events.push_back(HostEvent::Connect(id));
    }

    /// Retransmissions, keepalives and timeouts.
    fn maintain(&mut self, now: Instant) {
        let config = &self.config;
        let mut expired = Vec::new();

        for peer in self.peers.values_mut() {
            let idle_send = now.duration_since(peer.last_send);
            match peer.state {
                PeerState::Connecting => {
                    if now.duration_since(peer.state_since) >= config.peer_timeout {
                        expired.push(peer.id);
                    } else if idle_send >= config.resend_interval {
                        peer.last_send = now;
                        queue_frame(&mut self.outgoing, peer.addr, FrameKind::Connect);
                    }
                }
                PeerState::Connected => {
                    if now.duration_since(peer.last_receive) >= config.peer_timeout {
                        warn!("Peer {:?} at {} timed out", peer.id, peer.addr);
                        expired.push(peer.id);
                        continue;
                    }
                    for (index, channel) in peer.channels.iter_mut().enumerate() {
                        for (sequence, payload) in channel.due_for_resend(now, config.resend_interval)
                        {
                            peer.last_send = now;
                            queue_frame(
                                &mut self.outgoing,
                                peer.addr,
                                FrameKind::Reliable {
                                    channel: index as u8,
                                    sequence,
                                    payload,
                                },
                            );
                        }
                    }
                    if now.duration_since(peer.last_send) >= config.keepalive_interval {
                        peer.last_send = now;
                        queue_frame(&mut self.outgoing, peer.addr, FrameKind::Ping);
                    }
                }
                PeerState::Disconnecting => {
                    if now.duration_since(peer.state_since) >= config.disconnect_grace {
                        debug!("Peer {:?} did not acknowledge disconnect", peer.id);
                        expired.push(peer.id);
                    } else if idle_send >= config.resend_interval {
                        peer.last_send = now;
                        queue_frame(&mut self.outgoing, peer.addr, FrameKind::Disconnect);
                    }
                }
            }
        }

        for peer in expired {
            self.remove_peer(peer);
            self.events.push_back(HostEvent::Disconnect(peer));
        }
    }
}

fn queue_frame(outgoing: &mut VecDeque<(SocketAddr, Vec<u8>)>, addr: SocketAddr, kind: FrameKind) {
    match Frame::new(kind).to_bytes() {
        Ok(bytes) => outgoing.push_back((addr, bytes)),
        Err(e) => warn!("Failed to encode frame for {}: {}", addr, e),
    }
}
