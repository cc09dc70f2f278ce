//! # Turn Server Library
//!
//! This library provides the host side of the turn-taking number game. The
//! host owns the one authoritative copy of the round state, decides every
//! change to it, and broadcasts each decision to all connected peers so that
//! every mirror converges on the same values.
//!
//! ## Core Responsibilities
//!
//! ### Single Authority
//! Every state change, whether a peer pressed, the host's own participant
//! pressed, a timer ran out, or somebody joined or left, is resolved by the
//! [`authority::Authority`]. Peers never write shared state; they send a
//! request and wait for the resulting broadcast.
//!
//! ### Client Management
//! Handles the complete lifecycle of peer connections including:
//! - Connection acceptance and participant assignment
//! - Protocol version checks and capacity limits
//! - Disconnection handling, including forfeiting a leaver's numbers
//!
//! ### Ordered Broadcasting
//! Every decided fact carries a sequence number. Facts hold absolute values,
//! so applying one twice is harmless, and mirrors skip anything older than
//! what they already applied.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! The server processes all network events and clock ticks sequentially in
//! one loop. Presses are therefore decided in the order they reach the host,
//! which removes any race between two peers pressing at the same moment.
//!
//! ### TCP-Based Communication
//! Facts must arrive complete and in order, so peers talk to the host over
//! TCP. Each packet is a length-prefixed bincode frame. Every connection has
//! a dedicated writer task draining an in-order queue.
//!
//! ## Module Organization
//!
//! ### Authority Module (`authority`)
//! The round state machine: resolving events into facts, phase transitions,
//! turn timing, scoring and the leaderboard.
//!
//! ### Client Manager Module (`client_manager`)
//! Connection roster: pending sockets, registered participants, capacity and
//! per-peer outbound queues.
//!
//! ### Local Module (`local`)
//! Console presentation for a participant playing on the host itself.
//!
//! ### Network Module (`network`)
//! Socket handling and the main loop tying the other modules together.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use shared::RoundConfig;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:8080",
//!         Duration::from_millis(16),
//!         16,
//!         RoundConfig::default(),
//!     )
//!     .await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod authority;
pub mod client_manager;
pub mod local;
pub mod network;
