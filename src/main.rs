//! Geoduel CLI - score guesses, play solo sessions and simulate challenges.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cli;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

/// Geoduel - location-guessing game engine
#[derive(Parser, Debug)]
#[command(name = "geoduel")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Score a single guess against an actual location
    Score {
        /// Guessed latitude in degrees
        #[arg(allow_negative_numbers = true)]
        guess_lat: f64,

        /// Guessed longitude in degrees
        #[arg(allow_negative_numbers = true)]
        guess_lon: f64,

        /// Actual latitude in degrees
        #[arg(allow_negative_numbers = true)]
        actual_lat: f64,

        /// Actual longitude in degrees
        #[arg(allow_negative_numbers = true)]
        actual_lon: f64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Play one solo session with a simulated player
    Solo {
        /// Location catalog (JSON array of locations)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Restrict locations to one category
        #[arg(long)]
        category: Option<u64>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Run many head-to-head challenges in parallel and aggregate results
    Simulate {
        /// Location catalog (JSON array of locations)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Number of challenges to run (default: 100)
        #[arg(short = 'n', long, default_value = "100")]
        challenges: u64,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::SimulateFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,

        /// Write a store snapshot to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Show the achievement tier for a points total
    Tier {
        /// Points
        points: u32,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = args.config.as_deref();
    let result = match args.command {
        Commands::Score {
            guess_lat,
            guess_lon,
            actual_lat,
            actual_lon,
            format,
        } => cli::score::execute((guess_lat, guess_lon), (actual_lat, actual_lon), format, config),

        Commands::Solo {
            catalog,
            category,
            seed,
            format,
        } => cli::solo::execute(catalog, category, seed, format, config),

        Commands::Simulate {
            catalog,
            challenges,
            seed,
            threads,
            format,
            progress,
            save,
        } => cli::simulate::execute(catalog, challenges, seed, threads, format, progress, save, config),

        Commands::Tier { points } => cli::tier::execute(points),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
