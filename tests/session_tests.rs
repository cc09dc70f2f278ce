//! End-to-end sessions over real sockets
//!
//! A server runs on an ephemeral port and raw TCP peers drive it with the
//! same framing and mirror code the windowed client uses.

use client::game::{ClientGameState, ConnectionStatus};
use server::network::Server;
use shared::actor::FeedbackSink;
use shared::codec::{read_packet, write_packet};
use shared::{Packet, Phase, RoundConfig, PROTOCOL_VERSION};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Signals {
    correct: u32,
    incorrect: u32,
}

impl FeedbackSink for Signals {
    fn play_correct_signal(&mut self) {
        self.correct += 1;
    }
    fn play_incorrect_signal(&mut self) {
        self.incorrect += 1;
    }
}

struct TestPeer {
    stream: TcpStream,
    game: ClientGameState,
    signals: Signals,
}

impl TestPeer {
    async fn connect(addr: SocketAddr) -> Self {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        write_packet(
            &mut stream,
            &Packet::Connect {
                client_version: PROTOCOL_VERSION,
            },
        )
        .await
        .unwrap();

        Self {
            stream,
            game: ClientGameState::new(),
            signals: Signals::default(),
        }
    }

    /// Applies incoming packets until `done` holds for the mirror.
    async fn wait_until<F>(&mut self, done: F)
    where
        F: Fn(&ClientGameState) -> bool,
    {
        let result = timeout(WAIT, async {
            while !done(&self.game) {
                let packet = read_packet(&mut self.stream)
                    .await
                    .unwrap()
                    .expect("server closed the connection");
                self.game.handle_packet(packet, &mut self.signals);
            }
        })
        .await;
        assert!(result.is_ok(), "timed out, mirror at {:?}", self.game.state());
    }

    async fn press(&mut self) {
        let request = self.game.press().expect("nothing to press");
        write_packet(&mut self.stream, &request).await.unwrap();
    }
}

async fn start_server(max_clients: usize) -> SocketAddr {
    let config = RoundConfig {
        next_round_countdown: 0.1,
        game_over_countdown: 0.1,
        seed: Some(7),
        tokens_per_participant: Some(2),
        ..RoundConfig::default()
    };
    let mut server = Server::new("127.0.0.1:0", Duration::from_millis(10), max_clients, config)
        .await
        .unwrap();
    let addr = server.local_addr();

    tokio::spawn(async move {
        let _ = server.run().await;
    });
    addr
}

#[tokio::test]
async fn two_peers_play_and_one_leaves() {
    let addr = start_server(4).await;

    let mut a = TestPeer::connect(addr).await;
    a.wait_until(|game| game.participant().is_some()).await;
    let mut b = TestPeer::connect(addr).await;
    b.wait_until(|game| game.participant().is_some()).await;

    let a_id = a.game.participant().unwrap();
    let b_id = b.game.participant().unwrap();
    assert_ne!(a_id, b_id);

    for peer in [&mut a, &mut b] {
        peer.wait_until(|game| game.state().phase == Phase::Playing)
            .await;
        assert_eq!(peer.game.state().total_turns, 4);
        assert_eq!(peer.game.state().round_number, 1);
    }
    assert_eq!(a.game.state().participants, b.game.state().participants);

    let a_holds_first = a.game.state().participant(a_id).unwrap().tokens.front() == Some(&0);
    let (owner, other) = if a_holds_first {
        (&mut a, &mut b)
    } else {
        (&mut b, &mut a)
    };
    owner.press().await;

    for peer in [&mut *owner, &mut *other] {
        peer.wait_until(|game| game.state().current_turn == 1).await;
        assert_eq!(peer.signals.correct, 1);
        assert_eq!(peer.signals.incorrect, 0);
    }
    let owner_id = owner.game.participant().unwrap();
    assert_eq!(
        other.game.state().participant(owner_id).unwrap().tokens.len(),
        1
    );
    assert!(other.game.state().participant(owner_id).unwrap().score > 100);

    if a_holds_first {
        drop(a);
        b.wait_until(|game| game.state().phase == Phase::WaitingForPlayers)
            .await;
        assert!(b.game.state().participant(a_id).is_none());
        assert_eq!(b.game.state().active_count(), 1);
    } else {
        drop(b);
        a.wait_until(|game| game.state().phase == Phase::WaitingForPlayers)
            .await;
        assert!(a.game.state().participant(b_id).is_none());
        assert_eq!(a.game.state().active_count(), 1);
    }
}

#[tokio::test]
async fn late_peer_receives_snapshot() {
    let addr = start_server(4).await;

    let mut a = TestPeer::connect(addr).await;
    let mut b = TestPeer::connect(addr).await;
    a.wait_until(|game| game.state().phase == Phase::Playing).await;
    b.wait_until(|game| game.state().phase == Phase::Playing).await;

    let mut late = TestPeer::connect(addr).await;
    late.wait_until(|game| game.participant().is_some()).await;
    let late_id = late.game.participant().unwrap();

    let mirror = late.game.state();
    assert_eq!(mirror.phase, Phase::Playing);
    assert_eq!(mirror.participants.len(), 3);
    assert!(mirror.participant(late_id).unwrap().queued_for_next_round);
    assert!(late.game.press().is_none());
}

#[tokio::test]
async fn full_server_turns_peer_away() {
    let addr = start_server(1).await;

    let mut first = TestPeer::connect(addr).await;
    first.wait_until(|game| game.participant().is_some()).await;

    let mut second = TestPeer::connect(addr).await;
    second
        .wait_until(|game| matches!(game.status(), ConnectionStatus::Disconnected(_)))
        .await;
    assert_eq!(
        second.game.status(),
        &ConnectionStatus::Disconnected("Server full".to_string())
    );
}

#[tokio::test]
async fn version_mismatch_rejected() {
    let addr = start_server(4).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    write_packet(&mut stream, &Packet::Connect { client_version: 99 })
        .await
        .unwrap();

    let packet = timeout(WAIT, read_packet(&mut stream))
        .await
        .unwrap()
        .unwrap();
    match packet {
        Some(Packet::Disconnected { reason }) => assert_eq!(reason, "Protocol version mismatch"),
        other => panic!("Unexpected packet: {:?}", other),
    }
}
