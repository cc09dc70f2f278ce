//! Error kinds raised by the round rules and the wire codec.
//!
//! None of the rule errors are fatal: the authority logs them and keeps the
//! session running.

use crate::phase::Phase;
use crate::ParticipantId;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: Phase, to: Phase },

    #[error("stale press for token {token}, current turn is {current_turn}")]
    StalePress { token: u32, current_turn: u32 },

    #[error("cannot plan a round without active participants")]
    MalformedPlan,

    #[error("participant {participant} joined mid-round and sits out until the next restart")]
    LateJoin { participant: ParticipantId },

    #[error("unknown participant {0}")]
    UnknownParticipant(ParticipantId),

    #[error("packet of {0} bytes exceeds the frame limit")]
    PacketTooLarge(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GameError::InvalidTransition {
            from: Phase::Lobby,
            to: Phase::GameOver,
        };
        assert_eq!(
            err.to_string(),
            "invalid phase transition from Lobby to GameOver"
        );

        let err = GameError::StalePress {
            token: 3,
            current_turn: 4,
        };
        assert_eq!(err.to_string(), "stale press for token 3, current turn is 4");
        assert!(!GameError::MalformedPlan.to_string().is_empty());
    }
}
