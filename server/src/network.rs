//! Host network layer: TCP connections, request intake and broadcast fan-out

use crate::authority::{Authority, Outbound};
use crate::client_manager::ClientManager;
use crate::local::{ConsoleDisplay, ConsoleFeedback};
use log::{debug, error, info, warn};
use shared::actor::LocalActor;
use shared::codec::{read_packet, write_packet};
use shared::{Packet, ParticipantId, RoundConfig, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    Accepted {
        addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Packet>,
    },
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    ConnectionClosed {
        addr: SocketAddr,
    },
    /// The host's own participant pressed.
    LocalPress,
}

/// Host coordinating peer connections and the authority
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    authority: Authority,
    tick_duration: Duration,
    local_player: Option<ParticipantId>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
        config: RoundConfig,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(max_clients),
            authority: Authority::new(config),
            tick_duration,
            local_player: None,
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Lets the host machine play; presses are read from stdin lines.
    pub fn enable_local_player(&mut self) -> ParticipantId {
        let id = self.authority.connect_local();
        self.local_player = Some(id);
        info!("Local participant {}: press Enter to play your number", id);
        id
    }

    /// Spawns the task accepting new peer connections
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
                        }
                        let (read_half, write_half) = stream.into_split();
                        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

                        Self::spawn_writer(write_half, outbound_rx, addr);
                        // Registered before the reader starts so no packet can outrun it.
                        if server_tx
                            .send(ServerMessage::Accepted {
                                addr,
                                outbound: outbound_tx,
                            })
                            .is_err()
                        {
                            break;
                        }
                        Self::spawn_reader(read_half, addr, server_tx.clone());
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task forwarding one peer's packets to the main loop
    fn spawn_reader(
        mut read_half: OwnedReadHalf,
        addr: SocketAddr,
        server_tx: mpsc::UnboundedSender<ServerMessage>,
    ) {
        tokio::spawn(async move {
            loop {
                match read_packet(&mut read_half).await {
                    Ok(Some(packet)) => {
                        if let Err(e) = server_tx.send(ServerMessage::PacketReceived { packet, addr })
                        {
                            error!("Failed to send packet to main loop: {}", e);
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Dropping connection from {}: {}", addr, e);
                        break;
                    }
                }
            }
            let _ = server_tx.send(ServerMessage::ConnectionClosed { addr });
        });
    }

    /// Spawns the task draining one peer's outbound queue in order
    fn spawn_writer(
        mut write_half: OwnedWriteHalf,
        mut outbound_rx: mpsc::UnboundedReceiver<Packet>,
        addr: SocketAddr,
    ) {
        tokio::spawn(async move {
            while let Some(packet) = outbound_rx.recv().await {
                let closing = matches!(packet, Packet::Disconnected { .. });
                if let Err(e) = write_packet(&mut write_half, &packet).await {
                    error!("Failed to send packet to {}: {}", addr, e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });
    }

    /// Spawns the task turning stdin lines into local presses
    fn spawn_local_input(&self) {
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(_)) = lines.next_line().await {
                if server_tx.send(ServerMessage::LocalPress).is_err() {
                    break;
                }
            }
        });
    }

    /// Processes an incoming packet from a peer
    fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Connect { client_version } => {
                info!(
                    "Client connecting from {} (version: {})",
                    addr, client_version
                );

                if self.clients.find_client_by_addr(addr).is_some() {
                    warn!("Duplicate connect from {}", addr);
                    return;
                }

                let reason = if client_version != PROTOCOL_VERSION {
                    Some("Protocol version mismatch")
                } else if self.clients.is_full() {
                    Some("Server full")
                } else {
                    None
                };

                match reason {
                    Some(reason) => {
                        self.clients.send_to_pending(
                            addr,
                            Packet::Disconnected {
                                reason: reason.to_string(),
                            },
                        );
                    }
                    None => {
                        let id = self.authority.connect();
                        if !self.clients.register(addr, id) {
                            warn!("Connection {} closed before registering", addr);
                            self.authority.disconnect(id);
                        }
                    }
                }
            }

            Packet::Request { event } => match self.clients.find_client_by_addr(addr) {
                Some(id) => self.authority.handle_request(id, event),
                None => warn!("Request from unregistered connection {}", addr),
            },

            Packet::Disconnect => {
                if let Some(id) = self.clients.find_client_by_addr(addr) {
                    self.clients.remove_client(&id);
                    self.authority.disconnect(id);
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Hands everything the authority decided to the per-peer writers
    fn flush_outbound(&mut self) {
        for outbound in self.authority.drain_outbound() {
            match outbound {
                Outbound::SendTo {
                    participant,
                    packet,
                } => {
                    if Some(participant) != self.local_player {
                        self.clients.send_to(participant, packet);
                    }
                }
                Outbound::Broadcast { packet } => {
                    if let (Some(id), Packet::Broadcast { fact, .. }) = (self.local_player, &packet) {
                        LocalActor::new(id).react(fact, &mut ConsoleFeedback);
                    }
                    self.clients.broadcast(&packet);
                }
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();
        if self.local_player.is_some() {
            self.spawn_local_input();
        }

        let mut tick_interval = interval(self.tick_duration);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();
        let mut ticks: u64 = 0;
        let mut display = ConsoleDisplay::new();

        info!("Server started successfully");

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Accepted { addr, outbound }) => {
                            self.clients.accept(addr, outbound);
                        },
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr);
                        },
                        Some(ServerMessage::ConnectionClosed { addr }) => {
                            if let Some(id) = self.clients.drop_connection(addr) {
                                self.authority.disconnect(id);
                            }
                        },
                        Some(ServerMessage::LocalPress) => {
                            if let Some(id) = self.local_player {
                                self.authority.press_local(id);
                            }
                        },
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let now = Instant::now();
                    let dt = now.duration_since(last_tick).as_secs_f32();
                    last_tick = now;

                    self.authority.tick(dt);
                    ticks += 1;

                    if let Some(id) = self.local_player {
                        LocalActor::new(id).render(self.authority.state(), &mut display);
                    }

                    if ticks % 300 == 0 && !self.clients.is_empty() {
                        let state = self.authority.state();
                        debug!(
                            "Tick {}: {} peers, {:?}, turn {}/{}",
                            ticks,
                            self.clients.len(),
                            state.phase,
                            state.current_turn,
                            state.total_turns
                        );
                    }
                },
            }

            self.flush_outbound();
        }

        Ok(())
    }
}
