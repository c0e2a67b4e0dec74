//! One round of play: ask every living agent, resolve, flood.

use rand::Rng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::trace;

use crate::game::agent::Agent;
use crate::game::board::{Move, Terrain};
use crate::game::flood::flood;
use crate::game::sandbox::{self, Invocation};
use crate::game::state::MatchConfig;

/// One agent's part of a round.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    /// Index of the agent (also its rotation frame).
    pub agent: usize,
    /// What the sandbox got out of it.
    pub invocation: Invocation,
}

/// Everything that happened in a resolved round.
#[derive(Debug, Clone)]
pub struct RoundReport {
    /// Round number the report covers.
    pub round: u32,
    /// One entry per agent that was alive at the start of the round, in agent order.
    pub turns: Vec<AgentTurn>,
    /// Moves that were applied, in application order, with the issuing agent.
    pub applied: Vec<(usize, Move)>,
    /// Candidates that had gone stale by the time their turn came.
    pub skipped: usize,
    /// Cells the tide took this round.
    pub newly_sunk: usize,
}

impl RoundReport {
    /// Turns that ended in a forfeiture.
    pub fn forfeits(&self) -> impl Iterator<Item = &AgentTurn> {
        self.turns.iter().filter(|t| t.invocation.forfeit().is_some())
    }
}

/// Play one round on a copy of `terrain` and return the new terrain.
///
/// Candidates are collected from every agent flagged in `alive`, shuffled
/// with `rng`, and applied one by one against the board as it stands at that
/// point. A candidate that is no longer legal is dropped without penalty.
/// The tide for `round` then comes in over the result.
#[allow(clippy::cast_possible_truncation)]
pub fn resolve_round<R: Rng + ?Sized>(
    terrain: &Terrain,
    agents: &[Agent],
    alive: &[bool],
    round: u32,
    rng: &mut R,
    config: &MatchConfig,
) -> (Terrain, RoundReport) {
    let living: Vec<usize> = (0..agents.len())
        .filter(|&i| alive.get(i).copied().unwrap_or(false))
        .collect();

    let ask = |&agent: &usize| AgentTurn {
        agent,
        invocation: sandbox::invoke(
            &agents[agent],
            agent as u8,
            terrain,
            round,
            config.time_budget,
        ),
    };

    // Collection preserves agent order, so the shuffle below sees the same
    // input however the invocations were scheduled.
    let turns: Vec<AgentTurn> = if config.parallel {
        living.par_iter().map(ask).collect()
    } else {
        living.iter().map(ask).collect()
    };

    let mut candidates: Vec<(usize, Option<Move>)> = turns
        .iter()
        .map(|t| (t.agent, t.invocation.candidate()))
        .collect();
    candidates.shuffle(rng);

    let mut board = terrain.clone();
    let mut applied = Vec::with_capacity(candidates.len());
    let mut skipped = 0;
    for (agent, candidate) in candidates {
        let Some(mv) = candidate else {
            continue;
        };
        if board.apply(mv) {
            applied.push((agent, mv));
        } else {
            trace!(agent, round, %mv, "stale move skipped");
            skipped += 1;
        }
    }

    let sunk_before = board.sunk_count();
    let flooded = flood(&board, round);
    let newly_sunk = flooded.sunk_count() - sunk_before;

    let report = RoundReport {
        round,
        turns,
        applied,
        skipped,
        newly_sunk,
    };
    (flooded, report)
}
