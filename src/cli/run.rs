//! Run command implementation.

use super::output::format_text;
use super::{CliError, OutputFormat, match_config, seed_or_clock};
use rising_tide::tournament::MatchOutcome;
use rising_tide::{Match, MatchLog, SampleBot};
use std::path::Path;

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or the match aborts.
pub(crate) fn execute(
    bots: &[SampleBot],
    seed: Option<u64>,
    budget_ms: Option<u64>,
    log: Option<&Path>,
    format: OutputFormat,
    quiet: bool,
) -> Result<(), CliError> {
    let seed = seed_or_clock(seed);
    let config = match_config(budget_ms);

    // Each bot gets its own random stream derived from the match seed
    let agents = bots
        .iter()
        .zip(0u64..)
        .map(|(bot, i)| bot.agent(seed.wrapping_add(i)))
        .collect::<Vec<_>>();
    let names: Vec<String> = agents.iter().map(|a| a.name().to_string()).collect();

    let match_log = match log {
        Some(path) => MatchLog::to_file(path)
            .map_err(|e| CliError::new(format!("Failed to create {}: {e}", path.display())))?,
        None => MatchLog::disabled(),
    };

    if !quiet && format == OutputFormat::Text {
        println!("Running match with seed {seed}...");
        println!("Cities: {}", names.join(", "));
        println!();
    }

    let mut game = Match::new(agents, seed, config)?.with_log(match_log);
    game.run_to_end()?;

    let outcome = MatchOutcome::from_finished(seed, &game)?;

    match format {
        OutputFormat::Text => {
            print!("{}", format_text(&outcome));
            if let Some(path) = log.filter(|_| !quiet) {
                println!();
                println!("Match log written to: {}", path.display());
            }
        }
        OutputFormat::Json => {
            let json = serde_json::json!({
                "outcome": outcome,
                "final": game.view(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }

    Ok(())
}
