//! Tournament runner for Rising Tide matches.
//!
//! Provides a pure function interface: `(seed, agents) -> MatchOutcome`,
//! and a parallel series runner that aggregates many seeded matches.
//!
//! Matches of a series run on the rayon pool with a fold/reduce: every worker
//! accumulates into its own [`SeriesStats`] and the partial results are
//! merged at the end. All accumulators are integers, so the merged totals do
//! not depend on how the work was split.

#![allow(clippy::cast_precision_loss)]

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::MatchError;
use crate::game::{Agent, Match, MatchConfig, NUM_AGENTS};

/// Final result of one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    /// The seed used for this match.
    pub seed: u64,
    /// Rounds played.
    pub rounds: u32,
    /// Agent names, in city order.
    pub names: Vec<String>,
    /// Final scores, in city order.
    pub scores: [u32; NUM_AGENTS],
    /// Round each agent was eliminated in, `None` for survivors.
    pub eliminated: [Option<u32>; NUM_AGENTS],
    /// Forfeited moves per agent.
    pub forfeits: [u32; NUM_AGENTS],
    /// The single agent with the highest score, `None` on a tie.
    pub winner: Option<usize>,
}

/// Play one match to completion.
///
/// # Errors
///
/// Returns an error if the lineup is not exactly four agents or the engine
/// detects an invariant violation.
pub fn run_match(seed: u64, agents: Vec<Agent>, config: &MatchConfig) -> Result<MatchOutcome, MatchError> {
    let mut game = Match::new(agents, seed, *config)?;
    game.run_to_end()?;
    MatchOutcome::from_finished(seed, &game)
}

impl MatchOutcome {
    /// Summarize a match that has run to completion.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Invariant`] if the match has no final scores yet.
    pub fn from_finished(seed: u64, game: &Match) -> Result<Self, MatchError> {
        let scores = game
            .scores()
            .copied()
            .ok_or_else(|| MatchError::Invariant("match ended without scores".to_string()))?;

        Ok(Self {
            seed,
            rounds: game.round(),
            names: game.agents().iter().map(|a| a.name().to_string()).collect(),
            scores,
            eliminated: *game.eliminated_rounds(),
            forfeits: *game.forfeits(),
            winner: winner(&scores),
        })
    }
}

/// Index of the unique highest score.
#[must_use]
pub fn winner(scores: &[u32]) -> Option<usize> {
    let best = scores.iter().max()?;
    let mut leaders = scores.iter().enumerate().filter(|(_, s)| *s == best);
    let (idx, _) = leaders.next()?;
    leaders.next().is_none().then_some(idx)
}

/// Aggregated statistics over a series of matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesStats {
    /// Matches that finished.
    pub games_played: u64,
    /// Matches that ended with an engine error.
    pub failed: u64,
    /// Win count per seat.
    pub wins: [u64; NUM_AGENTS],
    /// Matches without a single winner.
    pub draws: u64,
    /// Forfeited moves per seat.
    pub forfeits: [u64; NUM_AGENTS],
    total_scores: [u64; NUM_AGENTS],
    score_sq_sums: [u64; NUM_AGENTS],
    total_rounds: u64,
}

impl SeriesStats {
    /// Empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a match result.
    pub fn add_outcome(&mut self, outcome: &MatchOutcome) {
        self.games_played += 1;
        self.total_rounds += u64::from(outcome.rounds);

        match outcome.winner {
            Some(idx) => self.wins[idx] += 1,
            None => self.draws += 1,
        }

        for seat in 0..NUM_AGENTS {
            let score = u64::from(outcome.scores[seat]);
            self.total_scores[seat] += score;
            self.score_sq_sums[seat] += score * score;
            self.forfeits[seat] += u64::from(outcome.forfeits[seat]);
        }
    }

    /// Count a match that could not be completed.
    pub fn add_failure(&mut self) {
        self.failed += 1;
    }

    /// Fold another partial result into this one.
    pub fn merge(&mut self, other: &Self) {
        self.games_played += other.games_played;
        self.failed += other.failed;
        self.draws += other.draws;
        self.total_rounds += other.total_rounds;
        for seat in 0..NUM_AGENTS {
            self.wins[seat] += other.wins[seat];
            self.forfeits[seat] += other.forfeits[seat];
            self.total_scores[seat] += other.total_scores[seat];
            self.score_sq_sums[seat] += other.score_sq_sums[seat];
        }
    }

    /// Win rate for a seat (0.0-1.0).
    #[must_use]
    pub fn win_rate(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Draw rate (0.0-1.0).
    #[must_use]
    pub fn draw_rate(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.draws as f64 / self.games_played as f64
    }

    /// Average score for a seat.
    #[must_use]
    pub fn avg_score(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_scores.get(seat).copied().unwrap_or(0) as f64 / self.games_played as f64
    }

    /// Population standard deviation of a seat's score.
    #[must_use]
    pub fn score_std_dev(&self, seat: usize) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        let n = self.games_played as f64;
        let mean = self.avg_score(seat);
        let sq_sum = self.score_sq_sums.get(seat).copied().unwrap_or(0) as f64;
        let variance = (sq_sum / n) - (mean * mean);
        if variance < 0.0 { 0.0 } else { variance.sqrt() }
    }

    /// Average match length in rounds.
    #[must_use]
    pub fn avg_rounds(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_rounds as f64 / self.games_played as f64
    }
}

/// Play `games` matches with seeds `base_seed`, `base_seed + 1`, ...
///
/// `lineup` builds a fresh set of agents for each match seed, so agents with
/// internal state never leak it from one match into the next.
pub fn run_series<F>(games: u64, base_seed: u64, config: &MatchConfig, lineup: F) -> SeriesStats
where
    F: Fn(u64) -> Vec<Agent> + Sync,
{
    run_series_with(games, base_seed, config, lineup, |_| {})
}

/// Like [`run_series`], calling `on_finish` after every completed match.
pub fn run_series_with<F, G>(
    games: u64,
    base_seed: u64,
    config: &MatchConfig,
    lineup: F,
    on_finish: G,
) -> SeriesStats
where
    F: Fn(u64) -> Vec<Agent> + Sync,
    G: Fn(&MatchOutcome) + Sync,
{
    info!(games, base_seed, "starting series");

    let stats = (0..games)
        .into_par_iter()
        .fold(SeriesStats::new, |mut local, i| {
            let seed = base_seed.wrapping_add(i);
            match run_match(seed, lineup(seed), config) {
                Ok(outcome) => {
                    on_finish(&outcome);
                    local.add_outcome(&outcome);
                }
                Err(e) => {
                    warn!(seed, error = %e, "match failed");
                    local.add_failure();
                }
            }
            local
        })
        .reduce(SeriesStats::new, |mut a, b| {
            a.merge(&b);
            a
        });

    info!(
        played = stats.games_played,
        failed = stats.failed,
        draws = stats.draws,
        "series finished"
    );
    stats
}
