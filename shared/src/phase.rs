//! Game phases and the transition table the authority enforces.

use crate::error::GameError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Lobby,
    WaitingForPlayers,
    WaitingForNextRound,
    RestartingRound,
    Playing,
    GameOver,
}

impl Phase {
    /// Phases counted down by `countdown_remaining`.
    pub fn has_countdown(self) -> bool {
        matches!(self, Phase::WaitingForNextRound | Phase::GameOver)
    }

    /// Phases during which a round's tokens are handed out or being consumed.
    pub fn round_in_progress(self) -> bool {
        matches!(self, Phase::RestartingRound | Phase::Playing)
    }

    pub fn can_transition(self, to: Phase) -> bool {
        use Phase::*;
        match (self, to) {
            (Lobby, WaitingForPlayers) => true,
            (WaitingForPlayers, WaitingForNextRound) => true,
            (WaitingForNextRound, RestartingRound) => true,
            (RestartingRound, Playing) => true,
            (Playing, GameOver) => true,
            (GameOver, WaitingForNextRound) => true,
            // Dropping under the participant minimum pauses any running phase.
            (WaitingForNextRound | RestartingRound | Playing | GameOver, WaitingForPlayers) => true,
            _ => false,
        }
    }

    pub fn check_transition(self, to: Phase) -> Result<(), GameError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(GameError::InvalidTransition { from: self, to })
        }
    }
}
