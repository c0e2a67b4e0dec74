//! Tournament command implementation.

use super::output::{JsonSeriesResult, format_series_csv, format_series_text};
use super::{CliError, TournamentFormat, match_config, seed_or_clock};
use indicatif::{ProgressBar, ProgressStyle};
use rising_tide::SampleBot;
use rising_tide::tournament::run_series_with;
use std::time::Instant;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the progress bar or the output cannot be set up.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn execute(
    bots: &[SampleBot],
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    budget_ms: Option<u64>,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_clock(seed);
    let config = match_config(budget_ms);
    let bot_names: Vec<String> = bots.iter().map(|b| b.name().to_string()).collect();

    let pb = if progress {
        let pb = ProgressBar::new(games);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} matches ({per_sec})")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    let lineup = |match_seed: u64| {
        bots.iter()
            .zip(0u64..)
            .map(|(bot, i)| bot.agent(match_seed.wrapping_add(i)))
            .collect::<Vec<_>>()
    };
    let stats = run_series_with(games, base_seed, &config, lineup, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_series_text(&stats, &bot_names));
            println!();
            println!("Duration: {:.2}s ({:.1} matches/sec)", duration.as_secs_f64(), games_per_sec);
        }
        TournamentFormat::Json => {
            let json_result = JsonSeriesResult::from_stats(&stats, &bot_names);
            println!("{}", serde_json::to_string_pretty(&json_result)?);
        }
        TournamentFormat::Csv => {
            print!("{}", format_series_csv(&stats, &bot_names));
        }
    }

    Ok(())
}
