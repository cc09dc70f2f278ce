//! Protocol, replicated round state and game rules shared by the authority
//! host and every mirroring peer.
//!
//! Both sides link this crate so that a broadcast fact is applied with exactly
//! the same code on the host's own copy of the state and on every mirror.

pub mod actor;
pub mod codec;
pub mod error;
pub mod phase;
pub mod planner;
pub mod protocol;
pub mod shuffle;
pub mod state;

pub use error::GameError;
pub use phase::Phase;
pub use protocol::{Event, Fact, Packet};
pub use state::{Leaderboard, LeaderboardEntry, ParticipantState, RoundState};

/// Stable connection identifier assigned by the authority.
pub type ParticipantId = u32;

pub const PROTOCOL_VERSION: u32 = 1;
pub const NEXT_ROUND_COUNTDOWN: f32 = 2.0;
pub const GAME_OVER_COUNTDOWN: f32 = 5.0;
pub const TURN_SECONDS: f32 = 5.0;
pub const WRONG_PRESS_PENALTY: u32 = 5;
pub const LEADERBOARD_SIZE: usize = 5;
pub const STARTING_SCORE: u32 = 100;
pub const MIN_PARTICIPANTS: usize = 2;

/// Tunables for one game session. Defaults reproduce the classic game.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundConfig {
    pub next_round_countdown: f32,
    pub game_over_countdown: f32,
    pub turn_seconds: f32,
    pub wrong_press_penalty: u32,
    pub leaderboard_size: usize,
    pub starting_score: u32,
    pub min_participants: usize,
    /// Seed for round planning; drawn from entropy when `None`.
    pub seed: Option<u64>,
    /// Overrides the tiered tokens-per-participant sizing.
    pub tokens_per_participant: Option<u32>,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            next_round_countdown: NEXT_ROUND_COUNTDOWN,
            game_over_countdown: GAME_OVER_COUNTDOWN,
            turn_seconds: TURN_SECONDS,
            wrong_press_penalty: WRONG_PRESS_PENALTY,
            leaderboard_size: LEADERBOARD_SIZE,
            starting_score: STARTING_SCORE,
            min_participants: MIN_PARTICIPANTS,
            seed: None,
            tokens_per_participant: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_default_config_matches_constants() {
        let config = RoundConfig::default();
        assert_approx_eq!(config.next_round_countdown, 2.0);
        assert_approx_eq!(config.game_over_countdown, 5.0);
        assert_approx_eq!(config.turn_seconds, 5.0);
        assert_eq!(config.wrong_press_penalty, 5);
        assert_eq!(config.leaderboard_size, 5);
        assert_eq!(config.min_participants, 2);
        assert!(config.seed.is_none());
        assert!(config.tokens_per_participant.is_none());
    }
}
