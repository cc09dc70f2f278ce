//! # Game Client Library
//!
//! This library provides the peer side of the turn-taking number game. A peer
//! mirrors the host's round state, shows it to the player, and turns the
//! player's presses into requests. It never decides the outcome of anything
//! itself; every change arrives as a numbered broadcast from the host.
//!
//! ## Architecture Overview
//!
//! ### Mirroring
//! On connect the host sends a full snapshot together with the sequence
//! number it reflects. After that the peer applies each broadcast whose
//! sequence number is newer than the last one it applied. Facts carry the
//! resulting values, so a duplicate changes nothing.
//!
//! ### Cosmetic Clocks
//! Between broadcasts the peer runs the countdown and turn timer down locally
//! so the display stays smooth. Only a broadcast moves the phase, the turn or
//! a score.
//!
//! ### Threading
//! macroquad owns the main thread and the frame loop. The TCP connection runs
//! on a tokio runtime in a background thread, and packets cross between the
//! two over unbounded channels.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The mirrored round state, connection status and the local participant.
//!
//! ### Input Module (`input`)
//! Edge-triggered press detection for Space and the left mouse button.
//!
//! ### HUD Module (`hud`)
//! Current number, round, timer, score, restart countdown, leaderboard panel
//! and the green/red answer flash.
//!
//! ### Network Module (`network`)
//! Connection handshake and the reader/writer pumps.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::game::ClientGameState;
//! use client::hud::Hud;
//! use client::network::{NetworkClient, NetworkEvent};
//!
//! # fn main() -> std::io::Result<()> {
//! let mut network = NetworkClient::spawn("127.0.0.1:8080".to_string())?;
//! let mut game = ClientGameState::new();
//! let mut hud = Hud::new(800.0, 600.0);
//!
//! // Once per frame
//! for event in network.poll() {
//!     match event {
//!         NetworkEvent::Received(packet) => game.handle_packet(packet, &mut hud),
//!         NetworkEvent::Closed(reason) => game.connection_lost(reason),
//!     }
//! }
//! game.update(1.0 / 60.0);
//! if let Some(request) = game.press() {
//!     network.send(request);
//! }
//! game.render(&mut hud);
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod hud;
pub mod input;
pub mod network;
