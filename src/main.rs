//! Rising Tide CLI - Command-line interface for running Rising Tide matches.

#![cfg_attr(test, allow(clippy::unwrap_used))]
// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use rising_tide::SampleBot;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Rising Tide - A four-player flooding survival game for bots
#[derive(Parser, Debug)]
#[command(name = "rising-tide")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single match between four sample bots
    Run {
        /// Bot codes, one per city (see `rising-tide bots`)
        #[arg(required = true, num_args = 4)]
        bots: Vec<SampleBot>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Time budget per move in milliseconds (default: 100)
        #[arg(short, long)]
        budget_ms: Option<u64>,

        /// Write the match log to this file
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Suppress the match banner
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run many seeded matches in parallel and aggregate statistics
    Tournament {
        /// Bot codes, one per city (see `rising-tide bots`)
        #[arg(required = true, num_args = 4)]
        bots: Vec<SampleBot>,

        /// Number of matches to run (default: 100)
        #[arg(short, long, default_value = "100")]
        games: u64,

        /// Starting seed (increments for each match)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Time budget per move in milliseconds (default: 100)
        #[arg(short, long)]
        budget_ms: Option<u64>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// List the sample bots
    Bots,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rising_tide=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Run {
            bots,
            seed,
            budget_ms,
            log,
            format,
            quiet,
        } => cli::run::execute(&bots, seed, budget_ms, log.as_deref(), format, quiet),

        Commands::Tournament {
            bots,
            games,
            seed,
            threads,
            budget_ms,
            format,
            progress,
        } => cli::tournament::execute(&bots, games, seed, threads, budget_ms, format, progress),

        Commands::Bots => {
            cli::bots::execute();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
