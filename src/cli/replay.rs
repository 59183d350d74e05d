//! Replay command implementation.

use super::{CliError, ReplayFormat};
use conquest::replay::{Recording, ReplayEngine};
use std::path::Path;

/// Execute the replay command.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or diverges on replay.
pub(crate) fn execute(
    recording_path: &Path,
    position: Option<usize>,
    format: ReplayFormat,
    steps: bool,
) -> Result<(), CliError> {
    let recording = Recording::load(recording_path).map_err(|e| {
        CliError::new(format!(
            "Failed to load recording {}: {e}",
            recording_path.display()
        ))
    })?;
    let target = position.unwrap_or(recording.commands.len());

    let mut engine = ReplayEngine::new(recording)?;
    if steps {
        print_state(&engine, format)?;
    }
    while engine.position() < target {
        engine.step_forward()?;
        if steps {
            if let Some(recorded) = engine.recording().commands.get(engine.position() - 1) {
                println!(
                    "--- command {}: {} by {} ---",
                    engine.position(),
                    recorded.command.name(),
                    recorded.player_id
                );
            }
            print_state(&engine, format)?;
        }
    }

    if !steps {
        print_state(&engine, format)?;
    }
    Ok(())
}

fn print_state(engine: &ReplayEngine, format: ReplayFormat) -> Result<(), CliError> {
    match format {
        ReplayFormat::Text => println!("{}", engine.render()),
        ReplayFormat::Json => println!("{}", serde_json::to_string_pretty(engine.state())?),
    }
    Ok(())
}
