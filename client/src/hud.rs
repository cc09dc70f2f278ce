use crate::game::ConnectionStatus;
use macroquad::prelude::*;
use shared::actor::{DisplaySink, FeedbackSink, RestartCountdown};

const FLASH_SECONDS: f32 = 0.35;
const BACKGROUND: Color = Color::new(0.1, 0.1, 0.1, 1.0);
const PANEL: Color = Color::new(0.0, 0.0, 0.0, 0.75);
const CORRECT: Color = Color::new(0.2, 0.8, 0.3, 1.0);
const INCORRECT: Color = Color::new(0.9, 0.25, 0.25, 1.0);

/// Answer signal currently on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flash {
    pub correct: bool,
    pub remaining: f32,
}

/// Everything the participant's screen shows, redrawn each frame
#[derive(Debug)]
pub struct Hud {
    width: f32,
    height: f32,
    token: Option<u32>,
    round: u32,
    timer: f32,
    score: u32,
    countdown: Option<RestartCountdown>,
    leaderboard: Vec<Option<u32>>,
    panel_visible: bool,
    flash: Option<Flash>,
}

impl Hud {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            token: None,
            round: 0,
            timer: 0.0,
            score: 0,
            countdown: None,
            leaderboard: Vec::new(),
            panel_visible: false,
            flash: None,
        }
    }

    pub fn flash(&self) -> Option<Flash> {
        self.flash
    }

    /// Starts a frame: fades the answer flash and forgets the last countdown.
    pub fn update(&mut self, dt: f32) {
        self.countdown = None;
        if let Some(flash) = &mut self.flash {
            flash.remaining -= dt;
            if flash.remaining <= 0.0 {
                self.flash = None;
            }
        }
    }

    pub fn draw(&self, status: &ConnectionStatus) {
        clear_background(BACKGROUND);

        if let Some(flash) = self.flash {
            let base = if flash.correct { CORRECT } else { INCORRECT };
            let alpha = (flash.remaining / FLASH_SECONDS).clamp(0.0, 1.0) * 0.4;
            draw_rectangle(
                0.0,
                0.0,
                self.width,
                self.height,
                Color::new(base.r, base.g, base.b, alpha),
            );
        }

        match status {
            ConnectionStatus::Connecting => {
                self.draw_centered("Connecting...", self.height / 2.0, 32.0, GRAY);
                return;
            }
            ConnectionStatus::Disconnected(reason) => {
                self.draw_centered(&format!("Disconnected: {}", reason), self.height / 2.0, 28.0, RED);
                return;
            }
            ConnectionStatus::Connected(_) => {}
        }

        draw_text(&format!("Round {}", self.round), 20.0, 36.0, 28.0, WHITE);
        draw_text(&format!("Score {}", self.score), 20.0, 70.0, 28.0, WHITE);
        if self.countdown.is_none() || self.panel_visible {
            draw_text(
                &format!("Time {:.1}", self.timer),
                self.width - 160.0,
                36.0,
                28.0,
                WHITE,
            );
        }

        let token = match self.token {
            Some(value) => value.to_string(),
            None => "-".to_string(),
        };
        self.draw_centered(&token, self.height / 2.0, 120.0, YELLOW);
        self.draw_centered(
            "Press SPACE or click when it is your number",
            self.height - 40.0,
            20.0,
            LIGHTGRAY,
        );

        let countdown = match self.countdown {
            Some(RestartCountdown::Seconds(seconds)) => {
                format!("Next round in {:.0}", seconds.ceil())
            }
            Some(RestartCountdown::Waiting) => "Waiting for players".to_string(),
            None => String::new(),
        };

        if self.panel_visible {
            self.draw_leaderboard(&countdown);
        } else {
            self.draw_centered(&countdown, self.height / 2.0 + 80.0, 24.0, GRAY);
        }
    }

    fn draw_leaderboard(&self, countdown: &str) {
        let panel_w = 320.0;
        let panel_h = 80.0 + self.leaderboard.len() as f32 * 32.0 + 40.0;
        let x = (self.width - panel_w) / 2.0;
        let y = (self.height - panel_h) / 2.0;

        draw_rectangle(x, y, panel_w, panel_h, PANEL);
        draw_rectangle_lines(x, y, panel_w, panel_h, 2.0, WHITE);
        draw_text("Game Over", x + 20.0, y + 40.0, 36.0, WHITE);

        for (rank, score) in self.leaderboard.iter().enumerate() {
            let line = match score {
                Some(score) => format!("{}. {}", rank + 1, score),
                None => format!("{}. -", rank + 1),
            };
            draw_text(&line, x + 30.0, y + 80.0 + rank as f32 * 32.0, 26.0, WHITE);
        }

        draw_text(countdown, x + 20.0, y + panel_h - 16.0, 22.0, LIGHTGRAY);
    }

    fn draw_centered(&self, text: &str, y: f32, size: f32, color: Color) {
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(text, (self.width - dims.width) / 2.0, y, size, color);
    }
}

impl DisplaySink for Hud {
    fn show_current_token(&mut self, token: Option<u32>) {
        self.token = token;
    }

    fn show_round(&mut self, round: u32) {
        self.round = round;
    }

    fn show_timer(&mut self, seconds: f32) {
        self.timer = seconds;
    }

    fn show_score(&mut self, score: u32) {
        self.score = score;
    }

    fn show_restart_countdown(&mut self, countdown: RestartCountdown) {
        self.countdown = Some(countdown);
    }

    fn show_leaderboard_entry(&mut self, rank: usize, score: Option<u32>) {
        if self.leaderboard.len() <= rank {
            self.leaderboard.resize(rank + 1, None);
        }
        self.leaderboard[rank] = score;
    }

    fn show_game_over_panel(&mut self, visible: bool) {
        self.panel_visible = visible;
    }
}

impl FeedbackSink for Hud {
    fn play_correct_signal(&mut self) {
        self.flash = Some(Flash {
            correct: true,
            remaining: FLASH_SECONDS,
        });
    }

    fn play_incorrect_signal(&mut self) {
        self.flash = Some(Flash {
            correct: false,
            remaining: FLASH_SECONDS,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_flash_fades() {
        let mut hud = Hud::new(800.0, 600.0);
        hud.play_incorrect_signal();
        assert_eq!(hud.flash().map(|f| f.correct), Some(false));

        hud.update(0.2);
        assert_approx_eq!(hud.flash().unwrap().remaining, FLASH_SECONDS - 0.2);
        hud.update(0.2);
        assert!(hud.flash().is_none());
    }

    #[test]
    fn test_countdown_cleared_each_frame() {
        let mut hud = Hud::new(800.0, 600.0);
        hud.show_restart_countdown(RestartCountdown::Seconds(2.0));
        assert_eq!(hud.countdown, Some(RestartCountdown::Seconds(2.0)));
        hud.update(0.016);
        assert!(hud.countdown.is_none());
    }

    #[test]
    fn test_latest_signal_wins() {
        let mut hud = Hud::new(800.0, 600.0);
        hud.play_incorrect_signal();
        hud.play_correct_signal();
        assert_eq!(hud.flash().map(|f| f.correct), Some(true));
    }

    #[test]
    fn test_leaderboard_entries_fill_by_rank() {
        let mut hud = Hud::new(800.0, 600.0);
        hud.show_leaderboard_entry(2, Some(80));
        hud.show_leaderboard_entry(0, Some(120));
        assert_eq!(hud.leaderboard, vec![Some(120), None, Some(80)]);
    }
}
