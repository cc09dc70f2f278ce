//! The authority: sole decider and writer of the canonical round state.
//!
//! Every change, whether a peer asked for it, the host's own participant
//! pressed, or a timer ran out, goes through [`Authority::propose`]. The
//! event is resolved against the current state into facts, each fact is
//! applied to the authority's own copy with the same code mirrors use, and
//! then queued for broadcast with the next sequence number.

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::actor::LocalActor;
use shared::planner::{owner_table, plan_round, plan_round_sized, RoundPlan};
use shared::{Event, Fact, GameError, Packet, ParticipantId, Phase, RoundConfig, RoundState};

/// Upper bound on chained phase changes settled in one call.
const MAX_SETTLE_STEPS: usize = 16;

/// Who originated a proposal. Only used in log lines; resolution never
/// depends on it. Connection lifecycle events are always `Authority`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Detected on the authority itself; no request hop.
    Authority,
    /// Requested by a remote peer.
    Peer(ParticipantId),
}

/// Packets for the network layer to deliver, in order.
#[derive(Debug, Clone)]
pub enum Outbound {
    SendTo {
        participant: ParticipantId,
        packet: Packet,
    },
    Broadcast {
        packet: Packet,
    },
}

pub struct Authority {
    config: RoundConfig,
    state: RoundState,
    /// Token value → participant holding it this round.
    owners: Vec<Option<ParticipantId>>,
    rng: StdRng,
    next_participant_id: ParticipantId,
    outbox: Vec<Outbound>,
}

impl Authority {
    pub fn new(config: RoundConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            config,
            state: RoundState::new(),
            owners: Vec::new(),
            rng,
            next_participant_id: 1,
            outbox: Vec::new(),
        }
    }

    pub fn state(&self) -> &RoundState {
        &self.state
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Holder of `token` this round, if still connected.
    pub fn owner_of(&self, token: u32) -> Option<ParticipantId> {
        self.owners
            .get(token as usize)
            .copied()
            .flatten()
            .filter(|id| self.state.participants.contains_key(id))
    }

    /// Takes everything queued for delivery since the last call.
    pub fn drain_outbound(&mut self) -> Vec<Outbound> {
        std::mem::take(&mut self.outbox)
    }

    /// Admits a remote peer and queues its welcome snapshot.
    pub fn connect(&mut self) -> ParticipantId {
        let participant = self.join(Origin::Authority);
        self.outbox.push(Outbound::SendTo {
            participant,
            packet: Packet::Welcome {
                participant,
                last_seq: self.state.last_seq,
                snapshot: self.state.clone(),
            },
        });
        participant
    }

    /// Admits the host's own participant. It reads the authority state directly.
    pub fn connect_local(&mut self) -> ParticipantId {
        self.join(Origin::Authority)
    }

    fn join(&mut self, origin: Origin) -> ParticipantId {
        let participant = self.next_participant_id;
        self.next_participant_id += 1;
        self.propose(origin, Event::Join { participant });
        participant
    }

    /// Removes a participant whose connection closed. Like a join, the host
    /// detects this itself.
    pub fn disconnect(&mut self, participant: ParticipantId) {
        self.propose(Origin::Authority, Event::Leave { participant });
    }

    /// Entry point for `Packet::Request` from a peer.
    pub fn handle_request(&mut self, sender: ParticipantId, event: Event) {
        if !event.peer_may_request() || event.participant() != Some(sender) {
            warn!("Dropping request {:?} from participant {}", event, sender);
            return;
        }
        self.propose(Origin::Peer(sender), event);
    }

    /// Press by the host's own participant, decided without a request hop.
    pub fn press_local(&mut self, participant: ParticipantId) {
        match LocalActor::new(participant).press(&self.state) {
            Some(event) => self.propose(Origin::Authority, event),
            None => debug!("Local participant {} has nothing to press", participant),
        }
    }

    /// Decides `event`, applies the resulting facts and queues them for broadcast.
    pub fn propose(&mut self, origin: Origin, event: Event) {
        debug!("Proposal from {:?}: {:?}", origin, event);
        match self.resolve(&event) {
            Ok(facts) => {
                for fact in facts {
                    self.commit(fact);
                }
            }
            Err(e) => warn!("Rejected {:?} from {:?}: {}", event, origin, e),
        }
        self.settle();
    }

    /// Runs the countdown and turn clocks, then any transition they trigger.
    pub fn tick(&mut self, dt: f32) {
        self.state.advance_clocks(dt);

        if self.state.phase == Phase::Playing && self.state.turn_deadline_remaining <= 0.0 {
            self.propose(Origin::Authority, Event::TurnTimeout);
        } else {
            self.settle();
        }
    }

    fn resolve(&mut self, event: &Event) -> Result<Vec<Fact>, GameError> {
        match *event {
            Event::Join { participant } => Ok(self.resolve_join(participant)),
            Event::Leave { participant } => self.resolve_leave(participant),
            Event::Press { participant, token } => self.resolve_press(participant, token),
            Event::TurnTimeout => Ok(self.resolve_timeout()),
            Event::Advance { to } => self.resolve_advance(to),
        }
    }

    fn resolve_join(&self, participant: ParticipantId) -> Vec<Fact> {
        if self.state.participants.contains_key(&participant) {
            return Vec::new();
        }

        let queued = self.state.phase.round_in_progress();
        if queued {
            info!("{}", GameError::LateJoin { participant });
        }

        let mut facts = vec![Fact::ParticipantJoined {
            participant,
            score: self.config.starting_score,
            queued,
        }];
        match self.state.phase {
            Phase::Lobby => facts.push(Fact::PhaseChanged {
                phase: Phase::WaitingForPlayers,
                countdown: 0.0,
            }),
            Phase::WaitingForNextRound => facts.push(Fact::CountdownReset {
                remaining: self.config.next_round_countdown,
            }),
            _ => {}
        }
        facts
    }

    fn resolve_leave(&self, participant: ParticipantId) -> Result<Vec<Fact>, GameError> {
        if !self.state.participants.contains_key(&participant) {
            return Err(GameError::UnknownParticipant(participant));
        }

        let current_turn = if self.state.phase == Phase::Playing {
            self.next_live_turn(self.state.current_turn, Some(participant))
        } else {
            self.state.current_turn
        };
        // A turn handed to a new holder starts with a full timer.
        let turn_deadline = if current_turn != self.state.current_turn {
            self.config.turn_seconds
        } else {
            self.state.turn_deadline_remaining
        };

        Ok(vec![Fact::ParticipantLeft {
            participant,
            current_turn,
            turn_deadline,
        }])
    }

    fn resolve_press(&self, participant: ParticipantId, token: u32) -> Result<Vec<Fact>, GameError> {
        let presser = self
            .state
            .participant(participant)
            .ok_or(GameError::UnknownParticipant(participant))?;

        if self.state.phase != Phase::Playing || !presser.is_active() {
            debug!(
                "Ignoring press of token {} by participant {} during {:?}",
                token, participant, self.state.phase
            );
            return Ok(Vec::new());
        }

        let current_turn = self.state.current_turn;
        let correct = token == current_turn && self.owner_of(token) == Some(participant);

        let fact = if correct {
            let award = self.state.turn_deadline_remaining.max(0.0).floor() as u32;
            Fact::PressResolved {
                participant,
                token,
                correct: true,
                score: presser.score.saturating_add(award),
                current_turn: self.next_live_turn(current_turn + 1, None),
                turn_deadline: self.config.turn_seconds,
            }
        } else {
            if token < current_turn {
                warn!(
                    "{}",
                    GameError::StalePress {
                        token,
                        current_turn
                    }
                );
            }
            Fact::PressResolved {
                participant,
                token,
                correct: false,
                score: presser.score.saturating_sub(self.config.wrong_press_penalty),
                current_turn,
                turn_deadline: self.state.turn_deadline_remaining,
            }
        };
        Ok(vec![fact])
    }

    fn resolve_timeout(&self) -> Vec<Fact> {
        if self.state.phase != Phase::Playing {
            return Vec::new();
        }

        // The holder of the current turn value is the one keeping everybody waiting.
        match self
            .owner_of(self.state.current_turn)
            .and_then(|id| self.state.participant(id))
        {
            Some(late) => vec![Fact::TurnExpired {
                participant: late.id,
                score: late.score.saturating_sub(self.config.wrong_press_penalty),
                turn_deadline: self.config.turn_seconds,
            }],
            None => {
                warn!(
                    "Turn {} expired with no live holder",
                    self.state.current_turn
                );
                Vec::new()
            }
        }
    }

    fn resolve_advance(&mut self, to: Phase) -> Result<Vec<Fact>, GameError> {
        self.state.phase.check_transition(to)?;

        let fact = match to {
            Phase::WaitingForPlayers => Fact::PhaseChanged {
                phase: to,
                countdown: 0.0,
            },
            Phase::WaitingForNextRound => Fact::PhaseChanged {
                phase: to,
                countdown: self.config.next_round_countdown,
            },
            Phase::RestartingRound => Fact::PhaseChanged {
                phase: to,
                countdown: 0.0,
            },
            Phase::Playing => match self.plan() {
                Ok(plan) => Fact::RoundStarted {
                    round_number: plan.round_number,
                    tokens_per_participant: plan.tokens_per_participant,
                    total_turns: plan.total_turns,
                    turn_deadline: self.config.turn_seconds,
                    assignments: plan.assignments,
                },
                Err(e) => {
                    warn!("{}; waiting for players", e);
                    Fact::PhaseChanged {
                        phase: Phase::WaitingForPlayers,
                        countdown: 0.0,
                    }
                }
            },
            Phase::GameOver => Fact::RoundFinished {
                leaderboard: self.state.compute_leaderboard(self.config.leaderboard_size),
                released: self
                    .state
                    .participants
                    .values()
                    .filter(|participant| !participant.is_active())
                    .map(|participant| participant.id)
                    .collect(),
                countdown: self.config.game_over_countdown,
            },
            Phase::Lobby => {
                return Err(GameError::InvalidTransition {
                    from: self.state.phase,
                    to,
                })
            }
        };
        Ok(vec![fact])
    }

    /// Plans the next round over the active roster. Queued participants are
    /// released before a restart, so nobody sits out twice.
    fn plan(&mut self) -> Result<RoundPlan, GameError> {
        let roster = self.state.active_ids();
        let round_number = self.state.round_number + 1;
        let seed: u64 = self.rng.gen();

        match self.config.tokens_per_participant {
            Some(size) => plan_round_sized(&roster, round_number, size, seed),
            None => plan_round(&roster, round_number, seed),
        }
    }

    /// First turn value at or after `from` whose holder is still connected.
    fn next_live_turn(&self, from: u32, leaving: Option<ParticipantId>) -> u32 {
        let mut turn = from;
        while turn < self.state.total_turns {
            match self.owner_of(turn) {
                Some(owner) if Some(owner) != leaving => break,
                _ => turn += 1,
            }
        }
        turn.min(self.state.total_turns)
    }

    /// Phase change implied by the current state, if any.
    fn pending_transition(&self) -> Option<Phase> {
        let state = &self.state;
        let enough = state.active_count() >= self.config.min_participants;

        match state.phase {
            Phase::Lobby => None,
            Phase::WaitingForPlayers => enough.then_some(Phase::WaitingForNextRound),
            _ if !enough => Some(Phase::WaitingForPlayers),
            Phase::WaitingForNextRound if state.countdown_remaining <= 0.0 => {
                Some(Phase::RestartingRound)
            }
            Phase::RestartingRound => Some(Phase::Playing),
            Phase::Playing if state.round_complete() => Some(Phase::GameOver),
            Phase::GameOver if state.countdown_remaining <= 0.0 => {
                Some(Phase::WaitingForNextRound)
            }
            _ => None,
        }
    }

    fn settle(&mut self) {
        for _ in 0..MAX_SETTLE_STEPS {
            let Some(to) = self.pending_transition() else {
                return;
            };
            match self.resolve_advance(to) {
                Ok(facts) => {
                    for fact in facts {
                        self.commit(fact);
                    }
                }
                Err(e) => {
                    warn!("{}", e);
                    return;
                }
            }
        }
        warn!("Phase transitions did not settle, stopping at {:?}", self.state.phase);
    }

    fn commit(&mut self, fact: Fact) {
        if let Fact::RoundStarted {
            total_turns,
            assignments,
            ..
        } = &fact
        {
            self.owners = owner_table(*total_turns, assignments);
        }

        let seq = self.state.last_seq + 1;
        self.state.apply(seq, &fact);

        match &fact {
            Fact::PhaseChanged { phase, .. } => info!("Phase -> {:?}", phase),
            Fact::RoundStarted {
                round_number,
                tokens_per_participant,
                total_turns,
                ..
            } => info!(
                "Round {} started: {} tokens each, {} turns",
                round_number, tokens_per_participant, total_turns
            ),
            Fact::RoundFinished { leaderboard, .. } => info!(
                "Round {} over, {} ranked",
                self.state.round_number,
                leaderboard.ranked()
            ),
            Fact::ParticipantJoined {
                participant,
                queued,
                ..
            } => info!("Participant {} joined (queued: {})", participant, queued),
            Fact::ParticipantLeft { participant, .. } => {
                info!("Participant {} left", participant)
            }
            other => debug!("Fact {}: {:?}", seq, other),
        }

        self.outbox.push(Outbound::Broadcast {
            packet: Packet::Broadcast { seq, fact },
        });
    }
}
