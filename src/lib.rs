// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Rising Tide: a deterministic four-player survival game for programming bots.
//!
//! Four agents share an 18x18 island of stacked land. Each round every agent
//! moves one unit of height between two neighboring cells, then the sea rises
//! and swallows whatever low ground it can reach from the edge. An agent is
//! out when its city goes under; the last ones standing score highest.
//!
//! This crate provides:
//! - Sandboxed agent calls with a per-move time budget
//! - Seeded, reproducible round resolution
//! - A plain-text match log
//! - Sample bots and a parallel tournament runner
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Tournament Runner            │
//! ├─────────────────────────────────────┤
//! │   Match (rounds, flood, scoring)    │
//! ├─────────────────────────────────────┤
//! │    Agent Sandbox (threads)          │
//! └─────────────────────────────────────┘
//! ```

pub mod bots;
pub mod error;
pub mod game;
pub mod log;
pub mod tournament;

pub use bots::SampleBot;
pub use error::{Forfeit, MatchError};
pub use log::MatchLog;

// Re-export key game types at crate root for convenience
pub use game::{Agent, Console, Coord, Match, MatchConfig, MatchView, Move, RawMove, Strategy, Terrain};
