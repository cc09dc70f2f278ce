//! Console presentation for the host's own participant.
//!
//! The host has no window; its participant reads the authority state
//! directly and reports what changed through the log.

use log::info;
use shared::actor::{DisplaySink, FeedbackSink, RestartCountdown};

/// Logs a status line whenever a shown value changes.
#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    token: Option<Option<u32>>,
    round: Option<u32>,
    score: Option<u32>,
    panel: Option<bool>,
    leaderboard: Vec<Option<u32>>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for ConsoleDisplay {
    fn show_current_token(&mut self, token: Option<u32>) {
        if self.token != Some(token) {
            match token {
                Some(value) => info!("Your number: {}", value),
                None => info!("Your number: none"),
            }
            self.token = Some(token);
        }
    }

    fn show_round(&mut self, round: u32) {
        if self.round != Some(round) {
            info!("Round {}", round);
            self.round = Some(round);
        }
    }

    // Too noisy for a log line every frame.
    fn show_timer(&mut self, _seconds: f32) {}

    fn show_score(&mut self, score: u32) {
        if self.score != Some(score) {
            info!("Score: {}", score);
            self.score = Some(score);
        }
    }

    fn show_restart_countdown(&mut self, _countdown: RestartCountdown) {}

    fn show_leaderboard_entry(&mut self, rank: usize, score: Option<u32>) {
        if self.leaderboard.len() <= rank {
            self.leaderboard.resize(rank + 1, None);
        }
        self.leaderboard[rank] = score;
    }

    fn show_game_over_panel(&mut self, visible: bool) {
        if self.panel == Some(visible) {
            return;
        }
        self.panel = Some(visible);
        if visible {
            let lines: Vec<String> = self
                .leaderboard
                .iter()
                .enumerate()
                .map(|(rank, score)| match score {
                    Some(score) => format!("{}. {}", rank + 1, score),
                    None => format!("{}. -", rank + 1),
                })
                .collect();
            info!("Game over! {}", lines.join("  "));
        }
    }
}

#[derive(Debug, Default)]
pub struct ConsoleFeedback;

impl FeedbackSink for ConsoleFeedback {
    fn play_correct_signal(&mut self) {
        info!("Correct!");
    }

    fn play_incorrect_signal(&mut self) {
        info!("Wrong!");
    }
}
