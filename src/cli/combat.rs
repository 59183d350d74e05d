//! Combat command implementation.

use super::output::format_combat;
use super::{CliError, OutputFormat};
use conquest::game::{CombatModifiers, RandomSource, resolve_combat};
use conquest::{GameConfig, Troops};

/// Execute the combat command.
///
/// # Errors
///
/// Returns an error if the modifiers are not valid JSON.
pub(crate) fn execute(
    config: &GameConfig,
    attacker: &Troops,
    defender: &Troops,
    seed: u32,
    modifiers: Option<&str>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let modifiers: CombatModifiers = match modifiers {
        Some(json) => serde_json::from_str(json)
            .map_err(|e| CliError::new(format!("Invalid modifiers: {e}")))?,
        None => CombatModifiers::default(),
    };

    let mut rng = RandomSource::new(seed);
    let result = resolve_combat(attacker, defender, &modifiers, &mut rng, config);

    match format {
        OutputFormat::Text => {
            println!("{attacker} vs {defender} (seed {seed})");
            print!("{}", format_combat(&result));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }
    Ok(())
}
