//! Run command implementation.

use super::output::{JsonGameResult, format_text};
use super::{CliError, OutputFormat, seed_or_clock};
use conquest::GameConfig;
use conquest::tournament::{TournamentConfig, run_game};
use std::path::PathBuf;

/// Arguments of the run command.
#[derive(Debug)]
pub(crate) struct RunOptions {
    pub(crate) seed: Option<u32>,
    pub(crate) players: usize,
    pub(crate) territories: usize,
    pub(crate) turns: u32,
    pub(crate) format: OutputFormat,
    pub(crate) save: Option<PathBuf>,
    pub(crate) quiet: bool,
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the game fails to run or the recording cannot be saved.
pub(crate) fn execute(config: &GameConfig, options: RunOptions) -> Result<(), CliError> {
    let seed = seed_or_clock(options.seed);
    let tournament = TournamentConfig {
        max_turns: options.turns,
        players: options.players,
        territories: options.territories,
        ..TournamentConfig::default()
    };

    if !options.quiet && options.format == OutputFormat::Text {
        println!("Running game with seed {seed}...");
        println!(
            "Players: {}, territories: {}",
            options.players, options.territories
        );
        println!();
    }

    let result = run_game(seed, &tournament, config)?;

    if let Some(save_path) = &options.save {
        result.recording.save(save_path)?;
        if !options.quiet && options.format == OutputFormat::Text {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    match options.format {
        OutputFormat::Text => print!("{}", format_text(&result)),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonGameResult::from_game_result(&result))?;
            println!("{json}");
        }
    }

    Ok(())
}
