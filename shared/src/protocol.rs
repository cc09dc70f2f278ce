//! Wire protocol between the authority and its peers.
//!
//! Peers only ever send requests; the authority decides and answers with
//! numbered broadcast facts. Facts carry resulting values (scores, turn
//! counter) rather than deltas so that a fact applied twice leaves the
//! mirror unchanged.

use crate::phase::Phase;
use crate::state::{Leaderboard, RoundState};
use crate::ParticipantId;
use serde::{Deserialize, Serialize};

/// Something a node wants to happen. Decided only by the authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// `participant` pressed while holding `token` at the front of its queue.
    Press {
        participant: ParticipantId,
        token: u32,
    },
    Join {
        participant: ParticipantId,
    },
    Leave {
        participant: ParticipantId,
    },
    /// The turn timer ran out before anyone pressed correctly.
    TurnTimeout,
    /// A phase change detected from timers or participant counts.
    Advance {
        to: Phase,
    },
}

impl Event {
    /// Only presses may be requested over the wire; join and leave come from
    /// the connection lifecycle and the rest from the authority's own clock.
    pub fn peer_may_request(&self) -> bool {
        matches!(self, Event::Press { .. })
    }

    pub fn participant(&self) -> Option<ParticipantId> {
        match self {
            Event::Press { participant, .. }
            | Event::Join { participant }
            | Event::Leave { participant } => Some(*participant),
            Event::TurnTimeout | Event::Advance { .. } => None,
        }
    }
}

/// A decided change, broadcast by the authority and applied by every node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fact {
    ParticipantJoined {
        participant: ParticipantId,
        score: u32,
        queued: bool,
    },
    ParticipantLeft {
        participant: ParticipantId,
        current_turn: u32,
        turn_deadline: f32,
    },
    CountdownReset {
        remaining: f32,
    },
    PhaseChanged {
        phase: Phase,
        countdown: f32,
    },
    RoundStarted {
        round_number: u32,
        tokens_per_participant: u32,
        total_turns: u32,
        turn_deadline: f32,
        assignments: Vec<(ParticipantId, Vec<u32>)>,
    },
    PressResolved {
        participant: ParticipantId,
        token: u32,
        correct: bool,
        score: u32,
        current_turn: u32,
        turn_deadline: f32,
    },
    TurnExpired {
        participant: ParticipantId,
        score: u32,
        turn_deadline: f32,
    },
    RoundFinished {
        leaderboard: Leaderboard,
        released: Vec<ParticipantId>,
        countdown: f32,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Packet {
    Connect {
        client_version: u32,
    },
    Request {
        event: Event,
    },
    Disconnect,

    Welcome {
        participant: ParticipantId,
        last_seq: u64,
        snapshot: RoundState,
    },
    Broadcast {
        seq: u64,
        fact: Fact,
    },
    Disconnected {
        reason: String,
    },
}
