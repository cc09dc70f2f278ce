//! Client-side mirror of the authority's round state

use log::{debug, info, warn};
use shared::actor::{DisplaySink, FeedbackSink, LocalActor};
use shared::{Packet, ParticipantId, RoundState};

/// Where this client stands with the host
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connecting,
    Connected(ParticipantId),
    Disconnected(String),
}

/// Mirrored round state plus the local participant acting on it
///
/// The mirror never decides anything. It installs the welcome snapshot,
/// then applies numbered broadcasts in order and skips anything it has
/// already seen.
#[derive(Debug)]
pub struct ClientGameState {
    state: RoundState,
    actor: Option<LocalActor>,
    status: ConnectionStatus,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self {
            state: RoundState::new(),
            actor: None,
            status: ConnectionStatus::Connecting,
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn participant(&self) -> Option<ParticipantId> {
        self.actor.map(|actor| actor.participant)
    }

    pub fn handle_packet<F: FeedbackSink + ?Sized>(&mut self, packet: Packet, feedback: &mut F) {
        match packet {
            Packet::Welcome {
                participant,
                last_seq,
                mut snapshot,
            } => {
                info!(
                    "Joined as participant {} at broadcast {} ({:?})",
                    participant, last_seq, snapshot.phase
                );
                snapshot.last_seq = last_seq;
                self.state = snapshot;
                self.actor = Some(LocalActor::new(participant));
                self.status = ConnectionStatus::Connected(participant);
            }

            Packet::Broadcast { seq, fact } => {
                let Some(actor) = self.actor else {
                    // Already part of the snapshot that is still on its way.
                    debug!("Broadcast {} arrived before welcome", seq);
                    return;
                };
                if self.state.apply(seq, &fact) {
                    actor.react(&fact, feedback);
                }
            }

            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connection_lost(reason);
            }

            _ => {
                warn!("Unexpected packet type from server");
            }
        }
    }

    pub fn connection_lost(&mut self, reason: String) {
        self.actor = None;
        self.status = ConnectionStatus::Disconnected(reason);
    }

    /// Runs the displayed clocks between broadcasts.
    pub fn update(&mut self, dt: f32) {
        self.state.advance_clocks(dt);
    }

    /// Request packet for a press, if the local participant may press now.
    pub fn press(&self) -> Option<Packet> {
        self.actor?
            .press(&self.state)
            .map(|event| Packet::Request { event })
    }

    pub fn render<D: DisplaySink + ?Sized>(&self, display: &mut D) {
        if let Some(actor) = self.actor {
            actor.render(&self.state, display);
        }
    }
}

impl Default for ClientGameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use shared::{Event, Fact, ParticipantState, Phase};

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

    fn playing_snapshot() -> RoundState {
        let mut snapshot = RoundState::new();
        let mut me = ParticipantState::new(1, 100, false);
        me.tokens = [0, 3].into_iter().collect();
        let mut other = ParticipantState::new(2, 100, false);
        other.tokens = [1, 2].into_iter().collect();
        snapshot.participants.insert(1, me);
        snapshot.participants.insert(2, other);
        snapshot.phase = Phase::Playing;
        snapshot.total_turns = 4;
        snapshot.turn_deadline_remaining = 5.0;
        snapshot.round_number = 1;
        snapshot
    }

    fn welcomed(last_seq: u64) -> ClientGameState {
        let mut game = ClientGameState::new();
        game.handle_packet(
            Packet::Welcome {
                participant: 1,
                last_seq,
                snapshot: playing_snapshot(),
            },
            &mut Signals::default(),
        );
        game
    }

    fn correct_press(seq: u64) -> Packet {
        Packet::Broadcast {
            seq,
            fact: Fact::PressResolved {
                participant: 1,
                token: 0,
                correct: true,
                score: 104,
                current_turn: 1,
                turn_deadline: 5.0,
            },
        }
    }

    #[test]
    fn test_welcome_installs_snapshot() {
        let game = welcomed(7);
        assert_eq!(game.status(), &ConnectionStatus::Connected(1));
        assert_eq!(game.participant(), Some(1));
        assert_eq!(game.state().last_seq, 7);
        assert_eq!(game.state().phase, Phase::Playing);
    }

    #[test]
    fn test_broadcast_before_welcome_ignored() {
        let mut game = ClientGameState::new();
        let mut signals = Signals::default();
        game.handle_packet(correct_press(1), &mut signals);

        assert_eq!(game.state().last_seq, 0);
        assert_eq!(signals.correct, 0);
        assert!(game.press().is_none());
    }

    #[test]
    fn test_duplicate_broadcast_applied_once() {
        let mut game = welcomed(7);
        let mut signals = Signals::default();

        game.handle_packet(correct_press(8), &mut signals);
        game.handle_packet(correct_press(8), &mut signals);
        game.handle_packet(correct_press(5), &mut signals);

        assert_eq!(signals.correct, 1);
        assert_eq!(game.state().current_turn, 1);
        assert_eq!(game.state().participant(1).unwrap().score, 104);
        assert_eq!(game.state().last_seq, 8);
    }

    #[test]
    fn test_press_builds_request() {
        let game = welcomed(3);
        match game.press() {
            Some(Packet::Request {
                event: Event::Press { participant, token },
            }) => {
                assert_eq!(participant, 1);
                assert_eq!(token, 0);
            }
            other => panic!("Unexpected press: {:?}", other),
        }
    }

    #[test]
    fn test_update_runs_turn_clock() {
        let mut game = welcomed(3);
        game.update(1.5);
        assert_approx_eq!(game.state().turn_deadline_remaining, 3.5);
        game.update(10.0);
        assert_approx_eq!(game.state().turn_deadline_remaining, 0.0);
    }

    #[test]
    fn test_disconnected_packet() {
        let mut game = welcomed(3);
        game.handle_packet(
            Packet::Disconnected {
                reason: "Server full".to_string(),
            },
            &mut Signals::default(),
        );
        assert_eq!(
            game.status(),
            &ConnectionStatus::Disconnected("Server full".to_string())
        );
        assert!(game.press().is_none());
    }
}
