//! Output formatting utilities for CLI.

use rising_tide::tournament::{MatchOutcome, SeriesStats};
use serde::Serialize;
use std::fmt::Write;

/// JSON-serializable per-seat tournament stats.
#[derive(Debug, Serialize)]
pub(super) struct JsonSeat {
    /// Seat index (1-based, city order).
    seat: usize,
    /// Bot name.
    bot: String,
    /// Number of wins.
    wins: u64,
    /// Win rate (0.0-1.0).
    win_rate: f64,
    /// Average score.
    avg_score: f64,
    /// Score standard deviation.
    score_std_dev: f64,
    /// Forfeited moves across the series.
    forfeits: u64,
}

/// JSON-serializable tournament result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSeriesResult {
    /// Matches that finished.
    games_played: u64,
    /// Matches that ended with an engine error.
    failed: u64,
    /// Number of draws.
    draws: u64,
    /// Average match length in rounds.
    avg_rounds: f64,
    /// Per-seat statistics.
    seats: Vec<JsonSeat>,
}

impl JsonSeriesResult {
    /// Create from stats and bot names.
    pub(super) fn from_stats(stats: &SeriesStats, bot_names: &[String]) -> Self {
        let seats = bot_names
            .iter()
            .enumerate()
            .map(|(i, name)| JsonSeat {
                seat: i + 1,
                bot: name.clone(),
                wins: stats.wins[i],
                win_rate: stats.win_rate(i),
                avg_score: stats.avg_score(i),
                score_std_dev: stats.score_std_dev(i),
                forfeits: stats.forfeits[i],
            })
            .collect();

        Self {
            games_played: stats.games_played,
            failed: stats.failed,
            draws: stats.draws,
            avg_rounds: stats.avg_rounds(),
            seats,
        }
    }
}

/// Format a match outcome as human-readable text.
pub(super) fn format_text(outcome: &MatchOutcome) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Match Result (seed: {})", outcome.seed);
    match outcome.winner {
        Some(idx) => {
            let _ = writeln!(output, "  Winner: {}", outcome.names[idx]);
        }
        None => output.push_str("  Winner: Draw\n"),
    }
    let _ = writeln!(output, "  Rounds: {}\n", outcome.rounds);

    for (i, name) in outcome.names.iter().enumerate() {
        let _ = write!(output, "  City {}: {} points ({name})", i + 1, outcome.scores[i]);
        match outcome.eliminated[i] {
            Some(round) => {
                let _ = write!(output, " [sunk round {round}]");
            }
            None => output.push_str(" [survived]"),
        }
        if outcome.forfeits[i] > 0 {
            let _ = write!(output, " [{} forfeits]", outcome.forfeits[i]);
        }
        output.push('\n');
    }

    output
}

/// Format tournament stats as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_series_text(stats: &SeriesStats, bot_names: &[String]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} matches)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for (i, name) in bot_names.iter().enumerate() {
        let _ = writeln!(
            output,
            "  City {} ({}): {:.1}% ({} wins)",
            i + 1,
            name,
            stats.win_rate(i) * 100.0,
            stats.wins[i]
        );
    }
    let _ = writeln!(
        output,
        "  Draws: {} ({:.1}%)\n",
        stats.draws,
        stats.draw_rate() * 100.0
    );

    output.push_str("Average Scores:\n");
    for (i, name) in bot_names.iter().enumerate() {
        let _ = writeln!(
            output,
            "  City {} ({}): {:.1} (+/- {:.1}), {} forfeits",
            i + 1,
            name,
            stats.avg_score(i),
            stats.score_std_dev(i),
            stats.forfeits[i]
        );
    }

    let _ = writeln!(output, "\nAverage Match Length: {:.0} rounds", stats.avg_rounds());
    if stats.failed > 0 {
        let _ = writeln!(output, "Failed Matches: {}", stats.failed);
    }

    output
}

/// Format tournament stats as CSV.
pub(super) fn format_series_csv(stats: &SeriesStats, bot_names: &[String]) -> String {
    let mut output = String::new();

    output.push_str("seat,bot,wins,win_rate,avg_score,score_std_dev,forfeits\n");
    for (i, name) in bot_names.iter().enumerate() {
        let _ = writeln!(
            output,
            "{},{},{},{:.4},{:.2},{:.2},{}",
            i + 1,
            name,
            stats.wins[i],
            stats.win_rate(i),
            stats.avg_score(i),
            stats.score_std_dev(i),
            stats.forfeits[i]
        );
    }

    output
}
