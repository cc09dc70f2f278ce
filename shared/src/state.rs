//! Replicated round state.
//!
//! The authority owns the canonical `RoundState`; every peer holds a mirror
//! that changes only by applying broadcast facts in sequence order. The
//! authority runs its own copy through the same `apply` path.

use crate::phase::Phase;
use crate::protocol::Fact;
use crate::ParticipantId;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Per-participant replicated record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantState {
    pub id: ParticipantId,
    pub score: u32,
    /// Private tokens for this round, ascending, consumed from the front.
    pub tokens: VecDeque<u32>,
    /// Joined mid-round and sits out until the next restart.
    pub queued_for_next_round: bool,
}

impl ParticipantState {
    pub fn new(id: ParticipantId, score: u32, queued_for_next_round: bool) -> Self {
        Self {
            id,
            score,
            tokens: VecDeque::new(),
            queued_for_next_round,
        }
    }

    pub fn is_active(&self) -> bool {
        !self.queued_for_next_round
    }

    pub fn front_token(&self) -> Option<u32> {
        self.tokens.front().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub participant: ParticipantId,
    pub score: u32,
}

/// Top scores of a finished round, padded with empty slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<Option<LeaderboardEntry>>,
}

impl Leaderboard {
    pub fn ranked(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_some()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundState {
    pub phase: Phase,
    /// Next valid token value.
    pub current_turn: u32,
    pub total_turns: u32,
    pub tokens_per_participant: u32,
    pub round_number: u32,
    pub countdown_remaining: f32,
    pub turn_deadline_remaining: f32,
    /// Roster in join order; ids are handed out increasing.
    pub participants: BTreeMap<ParticipantId, ParticipantState>,
    pub leaderboard: Option<Leaderboard>,
    /// Sequence number of the last broadcast applied.
    pub last_seq: u64,
}

impl RoundState {
    pub fn new() -> Self {
        Self {
            phase: Phase::Lobby,
            current_turn: 0,
            total_turns: 0,
            tokens_per_participant: 0,
            round_number: 0,
            countdown_remaining: 0.0,
            turn_deadline_remaining: 0.0,
            participants: BTreeMap::new(),
            leaderboard: None,
            last_seq: 0,
        }
    }

    pub fn participant(&self, id: ParticipantId) -> Option<&ParticipantState> {
        self.participants.get(&id)
    }

    /// Participants taking part in rounds, in roster order.
    pub fn active_ids(&self) -> Vec<ParticipantId> {
        self.participants
            .values()
            .filter(|participant| participant.is_active())
            .map(|participant| participant.id)
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.participants
            .values()
            .filter(|participant| participant.is_active())
            .count()
    }

    pub fn round_complete(&self) -> bool {
        self.current_turn >= self.total_turns
    }

    /// Applies a numbered broadcast. Returns false when `seq` was already seen.
    pub fn apply(&mut self, seq: u64, fact: &Fact) -> bool {
        if seq <= self.last_seq {
            debug!("Skipping broadcast {} (last applied {})", seq, self.last_seq);
            return false;
        }
        self.apply_fact(fact);
        self.last_seq = seq;
        true
    }

    /// Applies a fact. Every fact sets resulting values, so repeating one is a no-op.
    pub fn apply_fact(&mut self, fact: &Fact) {
        match fact {
            Fact::ParticipantJoined {
                participant,
                score,
                queued,
            } => {
                self.participants
                    .entry(*participant)
                    .or_insert_with(|| ParticipantState::new(*participant, *score, *queued));
            }

            Fact::ParticipantLeft {
                participant,
                current_turn,
                turn_deadline,
            } => {
                self.participants.remove(participant);
                self.current_turn = *current_turn;
                self.turn_deadline_remaining = *turn_deadline;
            }

            Fact::CountdownReset { remaining } => {
                self.countdown_remaining = *remaining;
            }

            Fact::PhaseChanged { phase, countdown } => {
                self.phase = *phase;
                self.countdown_remaining = *countdown;
                match phase {
                    Phase::WaitingForPlayers => {
                        // An aborted round frees everyone who was sitting out.
                        self.leaderboard = None;
                        for participant in self.participants.values_mut() {
                            participant.tokens.clear();
                            participant.queued_for_next_round = false;
                        }
                    }
                    Phase::RestartingRound => self.leaderboard = None,
                    _ => {}
                }
            }

            Fact::RoundStarted {
                round_number,
                tokens_per_participant,
                total_turns,
                turn_deadline,
                assignments,
            } => {
                self.round_number = *round_number;
                self.tokens_per_participant = *tokens_per_participant;
                self.total_turns = *total_turns;
                self.current_turn = 0;
                self.turn_deadline_remaining = *turn_deadline;
                self.phase = Phase::Playing;
                self.leaderboard = None;

                for participant in self.participants.values_mut() {
                    participant.tokens.clear();
                    participant.queued_for_next_round = false;
                }
                for (id, tokens) in assignments {
                    if let Some(participant) = self.participants.get_mut(id) {
                        participant.tokens = tokens.iter().copied().collect();
                    }
                }
            }

            Fact::PressResolved {
                participant,
                token,
                correct,
                score,
                current_turn,
                turn_deadline,
            } => {
                if let Some(state) = self.participants.get_mut(participant) {
                    state.score = *score;
                    if *correct && state.front_token() == Some(*token) {
                        state.tokens.pop_front();
                    }
                }
                if *correct {
                    self.current_turn = *current_turn;
                    self.turn_deadline_remaining = *turn_deadline;
                }
            }

            Fact::TurnExpired {
                participant,
                score,
                turn_deadline,
            } => {
                if let Some(state) = self.participants.get_mut(participant) {
                    state.score = *score;
                }
                self.turn_deadline_remaining = *turn_deadline;
            }

            Fact::RoundFinished {
                leaderboard,
                released,
                countdown,
            } => {
                self.phase = Phase::GameOver;
                self.countdown_remaining = *countdown;
                self.leaderboard = Some(leaderboard.clone());
                for id in released {
                    if let Some(participant) = self.participants.get_mut(id) {
                        participant.queued_for_next_round = false;
                    }
                }
            }
        }
    }

    /// Runs the countdown and turn clocks down by `dt`, never below zero.
    pub fn advance_clocks(&mut self, dt: f32) {
        if self.phase.has_countdown() {
            self.countdown_remaining = (self.countdown_remaining - dt).max(0.0);
        }
        if self.phase == Phase::Playing {
            self.turn_deadline_remaining = (self.turn_deadline_remaining - dt).max(0.0);
        }
    }

    /// Ranks active participants by score, highest first, padded to `size`.
    pub fn compute_leaderboard(&self, size: usize) -> Leaderboard {
        let mut ranked: Vec<LeaderboardEntry> = self
            .participants
            .values()
            .filter(|participant| participant.is_active())
            .map(|participant| LeaderboardEntry {
                participant: participant.id,
                score: participant.score,
            })
            .collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.participant.cmp(&b.participant)));

        let mut entries: Vec<Option<LeaderboardEntry>> =
            ranked.into_iter().take(size).map(Some).collect();
        entries.resize(size, None);
        Leaderboard { entries }
    }
}

impl Default for RoundState {
    fn default() -> Self {
        Self::new()
    }
}
