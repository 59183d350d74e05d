//! Conquest CLI - run, replay and benchmark automated matches.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use conquest::Troops;
use std::path::PathBuf;
use std::process::ExitCode;

/// Conquest - a deterministic territorial conquest rules engine
#[derive(Parser, Debug)]
#[command(name = "conquest")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Game configuration JSON, merged over the defaults
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a single game between heuristic bots
    Run {
        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u32>,

        /// Number of players (default: 2)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Territories on the generated map (default: 20)
        #[arg(long, default_value = "20")]
        territories: usize,

        /// Maximum turns (default: 400)
        #[arg(short, long, default_value = "400")]
        turns: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save recording to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Only print the result
        #[arg(short, long)]
        quiet: bool,
    },

    /// Replay a recorded game
    Replay {
        /// Recording file (JSON)
        #[arg(required = true)]
        recording: PathBuf,

        /// Stop after this many commands (default: all)
        #[arg(short, long)]
        position: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::ReplayFormat,

        /// Print the state after every command
        #[arg(long)]
        steps: bool,
    },

    /// Run mass parallel games and aggregate statistics
    Tournament {
        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u32,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u32>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Number of players per game (default: 2)
        #[arg(short, long, default_value = "2")]
        players: usize,

        /// Territories on each generated map (default: 20)
        #[arg(long, default_value = "20")]
        territories: usize,

        /// Maximum turns per game (default: 400)
        #[arg(short = 't', long)]
        max_turns: Option<u32>,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(long)]
        progress: bool,
    },

    /// Resolve one battle and print the dice
    Combat {
        /// Attacking units, e.g. "warrior=3,elite=1"
        #[arg(short, long)]
        attacker: Troops,

        /// Defending units, e.g. "warrior=2"
        #[arg(short, long)]
        defender: Troops,

        /// Dice seed
        #[arg(short, long, default_value = "12345")]
        seed: u32,

        /// Modifiers as JSON, e.g. '{"attackerRerolls": 1}'
        #[arg(short, long)]
        modifiers: Option<String>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    cli::init_tracing(args.verbose);

    let result = cli::load_config(args.config.as_deref()).and_then(|config| match args.command {
        Commands::Run {
            seed,
            players,
            territories,
            turns,
            format,
            save,
            quiet,
        } => cli::run::execute(
            &config,
            cli::run::RunOptions {
                seed,
                players,
                territories,
                turns,
                format,
                save,
                quiet,
            },
        ),

        Commands::Replay {
            recording,
            position,
            format,
            steps,
        } => cli::replay::execute(&recording, position, format, steps),

        Commands::Tournament {
            games,
            seed,
            threads,
            players,
            territories,
            max_turns,
            format,
            progress,
        } => cli::tournament::execute(
            &config,
            cli::tournament::TournamentOptions {
                games,
                seed,
                threads,
                players,
                territories,
                max_turns,
                format,
                progress,
            },
        ),

        Commands::Combat {
            attacker,
            defender,
            seed,
            modifiers,
            format,
        } => cli::combat::execute(&config, &attacker, &defender, seed, modifiers.as_deref(), format),
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
