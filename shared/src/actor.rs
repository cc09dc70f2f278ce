//! The local participant's side of the game: turning an input edge into a
//! press request, reacting to resolved presses, and describing the mirrored
//! state to whatever displays it.

use crate::phase::Phase;
use crate::protocol::{Event, Fact};
use crate::state::RoundState;
use crate::ParticipantId;

/// Restart countdown as shown to players.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestartCountdown {
    Seconds(f32),
    Waiting,
}

/// Receives everything a participant's screen shows.
pub trait DisplaySink {
    fn show_current_token(&mut self, token: Option<u32>);
    fn show_round(&mut self, round: u32);
    fn show_timer(&mut self, seconds: f32);
    fn show_score(&mut self, score: u32);
    fn show_restart_countdown(&mut self, countdown: RestartCountdown);
    fn show_leaderboard_entry(&mut self, rank: usize, score: Option<u32>);
    fn show_game_over_panel(&mut self, visible: bool);
}

/// Fire-and-forget answer signals.
pub trait FeedbackSink {
    fn play_correct_signal(&mut self);
    fn play_incorrect_signal(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalActor {
    pub participant: ParticipantId,
}

impl LocalActor {
    pub fn new(participant: ParticipantId) -> Self {
        Self { participant }
    }

    /// Press request for the front token, if this participant may press now.
    pub fn press(&self, state: &RoundState) -> Option<Event> {
        if state.phase != Phase::Playing {
            return None;
        }
        let me = state.participant(self.participant)?;
        if !me.is_active() {
            return None;
        }
        me.front_token().map(|token| Event::Press {
            participant: self.participant,
            token,
        })
    }

    /// Plays the answer signal for every resolved press, whoever made it.
    pub fn react<F: FeedbackSink + ?Sized>(&self, fact: &Fact, feedback: &mut F) {
        if let Fact::PressResolved { correct, .. } = fact {
            if *correct {
                feedback.play_correct_signal();
            } else {
                feedback.play_incorrect_signal();
            }
        }
    }

    pub fn render<D: DisplaySink + ?Sized>(&self, state: &RoundState, display: &mut D) {
        let me = state.participant(self.participant);

        display.show_round(state.round_number);
        display.show_score(me.map(|p| p.score).unwrap_or(0));
        display.show_current_token(me.and_then(|p| p.front_token()));

        match state.phase {
            Phase::Playing => {
                display.show_timer(state.turn_deadline_remaining);
                display.show_game_over_panel(false);
            }
            Phase::GameOver => {
                display.show_timer(state.turn_deadline_remaining);
                display.show_restart_countdown(if state.countdown_remaining > 0.0 {
                    RestartCountdown::Seconds(state.countdown_remaining)
                } else {
                    RestartCountdown::Waiting
                });
                if let Some(leaderboard) = &state.leaderboard {
                    for (rank, entry) in leaderboard.entries.iter().enumerate() {
                        display.show_leaderboard_entry(rank, entry.map(|e| e.score));
                    }
                }
                display.show_game_over_panel(true);
            }
            Phase::WaitingForNextRound => {
                display.show_restart_countdown(RestartCountdown::Seconds(
                    state.countdown_remaining,
                ));
                display.show_game_over_panel(false);
            }
            Phase::Lobby | Phase::WaitingForPlayers | Phase::RestartingRound => {
                display.show_restart_countdown(RestartCountdown::Waiting);
                display.show_game_over_panel(false);
            }
        }
    }
}
