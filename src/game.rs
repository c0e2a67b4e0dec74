//! Game layer for Rising Tide.
//!
//! Implements the rules of the match:
//! - Board with heights, cities and the sea beyond the edge
//! - Agents and their sandboxed decisions
//! - Round resolution in a seeded random order
//! - The rising tide
//! - Elimination and scoring

mod agent;
mod board;
mod flood;
mod invariants;
mod resolver;
mod sandbox;
mod state;

pub use agent::{Agent, Console, RawMove, Strategy};
pub use board::{
    BOARD_SIZE, CITIES, CITY, Coord, MAX_HEIGHT, Move, SUNK, Terrain, dist, is_legal,
    is_near_water, legal_moves, neighbors, rotate, to_canonical, to_local,
};
pub use flood::{FLOOD_CAP_ROUND, ROUNDS_PER_LEVEL, below_waterline, flood};
pub use invariants::{InvariantViolation, check_invariants};
pub use resolver::{AgentTurn, RoundReport, resolve_round};
pub use sandbox::{DEFAULT_TIME_BUDGET, Invocation, invoke, silence_agent_panics};
pub use state::{AgentStatus, Match, MatchConfig, MatchView, NUM_AGENTS, SURVIVOR_SCORE};
