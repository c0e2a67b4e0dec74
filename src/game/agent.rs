//! Agents: the pluggable decision makers that control one city each.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::game::board::Terrain;

/// An unvalidated move as returned by an agent: `[[src_row, src_col], [dst_row, dst_col]]`.
pub type RawMove = [[i64; 2]; 2];

/// Text an agent writes while deciding.
///
/// The sandbox forwards everything written here to the match log, tagged with
/// the agent's name. Text written before a deadline is kept even if the agent
/// never answers.
#[derive(Debug, Default, Clone)]
pub struct Console {
    text: String,
    mirror: Option<Arc<Mutex<String>>>,
}

impl Console {
    /// Create an empty console.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A console that also copies every write into `mirror` as it happens.
    pub(crate) fn mirrored(mirror: Arc<Mutex<String>>) -> Self {
        Self {
            text: String::new(),
            mirror: Some(mirror),
        }
    }

    /// Append a line.
    pub fn print(&mut self, line: impl fmt::Display) {
        self.push(&format!("{line}\n"));
    }

    fn push(&mut self, s: &str) {
        self.text.push_str(s);
        if let Some(mirror) = &self.mirror {
            mirror.lock().unwrap_or_else(PoisonError::into_inner).push_str(s);
        }
    }

    /// Whether nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Everything written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Consume the console, returning its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push(s);
        Ok(())
    }
}

/// A decision function.
///
/// `terrain` is a private copy of the board rotated into the agent's own
/// frame, so the agent's city is always at [`CITIES[0]`](crate::game::CITIES).
/// The agent may scribble on it freely. Returning `None` passes the round.
pub trait Strategy: Send + Sync + 'static {
    /// Pick a move for `round`.
    fn decide(&self, terrain: &mut Terrain, round: u32, console: &mut Console) -> Option<RawMove>;
}

impl<F> Strategy for F
where
    F: Fn(&mut Terrain, u32, &mut Console) -> Option<RawMove> + Send + Sync + 'static,
{
    fn decide(&self, terrain: &mut Terrain, round: u32, console: &mut Console) -> Option<RawMove> {
        self(terrain, round, console)
    }
}

/// A participant: identity plus decision function.
#[derive(Clone)]
pub struct Agent {
    name: String,
    code: String,
    strategy: Arc<dyn Strategy>,
}

impl Agent {
    /// Create an agent from a name, a short display code and a strategy.
    #[must_use]
    pub fn new(name: impl Into<String>, code: impl Into<String>, strategy: impl Strategy) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            strategy: Arc::new(strategy),
        }
    }

    /// Create an agent from a closure.
    #[must_use]
    pub fn from_fn<F>(name: impl Into<String>, code: impl Into<String>, decide: F) -> Self
    where
        F: Fn(&mut Terrain, u32, &mut Console) -> Option<RawMove> + Send + Sync + 'static,
    {
        Self::new(name, code, decide)
    }

    /// Full name, used in the match log.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Short code, used on the board.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Shared handle to the decision function.
    #[must_use]
    pub fn strategy(&self) -> Arc<dyn Strategy> {
        Arc::clone(&self.strategy)
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("code", &self.code)
            .finish_non_exhaustive()
    }
}
