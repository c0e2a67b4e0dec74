//! Error types for the engine.
//!
//! Two families live here. [`Forfeit`] describes agent misbehavior, which is
//! always recovered within the round by substituting "no move". [`MatchError`]
//! describes engine-level failures that end the match.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::game::RawMove;

/// Reason an agent's move was discarded for a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Forfeit {
    /// The agent did not answer within its time budget.
    Timeout {
        /// Wall-clock time observed before giving up (or until the late reply).
        elapsed: Duration,
        /// The reply, if it arrived after the budget had expired.
        late_reply: Option<Option<RawMove>>,
    },
    /// The decision function panicked.
    Fault {
        /// Panic payload rendered as text.
        message: String,
    },
    /// The reply was not a legal move on the agent's own snapshot.
    ///
    /// Coordinates off the board, negative ones included, land here.
    Illegal {
        /// The reply as sent, in the agent's local frame.
        attempted: RawMove,
    },
}

impl Forfeit {
    /// Short label used in reports and statistics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Fault { .. } => "fault",
            Self::Illegal { .. } => "illegal",
        }
    }
}

impl fmt::Display for Forfeit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { elapsed, .. } => {
                write!(f, "timed out after {:.1} ms", elapsed.as_secs_f64() * 1000.0)
            }
            Self::Fault { message } => write!(f, "fault: {message}"),
            Self::Illegal { attempted } => write!(f, "illegal move: {attempted:?}"),
        }
    }
}

/// Unrecoverable match failure.
#[derive(Debug, Error)]
pub enum MatchError {
    /// A match needs exactly one agent per city.
    #[error("expected 4 agents, got {0}")]
    AgentCount(usize),

    /// A terrain grid had the wrong shape.
    #[error("terrain must be {expected}x{expected}, got {rows} rows (row {row} has {cols} cells)")]
    GridDimensions {
        /// Required side length.
        expected: usize,
        /// Number of rows supplied.
        rows: usize,
        /// First offending row (or `rows` when the row count itself is wrong).
        row: usize,
        /// Length of the offending row.
        cols: usize,
    },

    /// A terrain cell held a value outside -1..=8.
    #[error("terrain cell ({row}, {col}) holds {value}, outside -1..=8")]
    CellOutOfRange {
        /// Row of the cell.
        row: usize,
        /// Column of the cell.
        col: usize,
        /// Offending value.
        value: i64,
    },

    /// A city cell on a custom board was not at city height.
    #[error("city {index} must start at height 0, found {height}")]
    InvalidCity {
        /// Index of the city.
        index: usize,
        /// Height found in its cell.
        height: i8,
    },

    /// An engine invariant was violated.
    #[error("invariant violation: {0}")]
    Invariant(String),

    /// The match log could not be opened.
    #[error("log I/O error: {0}")]
    Io(#[from] std::io::Error),
}
