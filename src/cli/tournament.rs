//! Tournament command implementation.

use super::output::{
    JsonTournamentResult, TournamentStats, format_tournament_csv, format_tournament_text,
};
use super::{CliError, TournamentFormat, seed_or_clock};
use conquest::GameConfig;
use conquest::tournament::{TournamentConfig, run_game};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use tracing::warn;

/// Arguments of the tournament command.
#[derive(Debug)]
pub(crate) struct TournamentOptions {
    pub(crate) games: u32,
    pub(crate) seed: Option<u32>,
    pub(crate) threads: Option<usize>,
    pub(crate) players: usize,
    pub(crate) territories: usize,
    pub(crate) max_turns: Option<u32>,
    pub(crate) format: TournamentFormat,
    pub(crate) progress: bool,
}

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the progress bar template or output serialization fails.
pub(crate) fn execute(config: &GameConfig, options: TournamentOptions) -> Result<(), CliError> {
    // Set thread pool size if specified
    if let Some(num_threads) = options.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_clock(options.seed);

    let mut tournament = TournamentConfig {
        players: options.players,
        territories: options.territories,
        ..TournamentConfig::default()
    };
    if let Some(t) = options.max_turns {
        tournament.max_turns = t;
    }

    let pb = if options.progress {
        let pb = ProgressBar::new(u64::from(options.games));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();
    let num_players = options.players;

    // Each thread accumulates into its own TournamentStats, then we merge at the end
    let stats = (0..options.games)
        .into_par_iter()
        .fold(
            || TournamentStats::new(num_players),
            |mut local_stats, i| {
                let game_seed = base_seed.wrapping_add(i);
                match run_game(game_seed, &tournament, config) {
                    Ok(result) => local_stats.add_result(&result),
                    Err(err) => {
                        warn!(seed = game_seed, %err, "game failed");
                        local_stats.add_error();
                    }
                }
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
                local_stats
            },
        )
        .reduce(
            || TournamentStats::new(num_players),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        f64::from(options.games) / duration.as_secs_f64()
    } else {
        0.0
    };

    match options.format {
        TournamentFormat::Text => {
            println!();
            print!("{}", format_tournament_text(&stats));
            println!();
            println!(
                "Duration: {:.2}s ({:.0} games/sec)",
                duration.as_secs_f64(),
                games_per_sec
            );
        }
        TournamentFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonTournamentResult::from_stats(&stats))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats));
        }
    }

    Ok(())
}
