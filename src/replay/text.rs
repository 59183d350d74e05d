//! Plain-text state dump for terminals and logs.

// format! into push_str reads better here than write! with error plumbing.
#![allow(clippy::format_push_string)]

use crate::game::{GameState, Player};

/// Render game state as structured text.
///
/// Output format:
/// ```text
/// === MATCH m1 | TURN 7 | DEPLOY | current p2 ===
///
/// PLAYER p1 (seat 0):
/// - Gold: 340, actions 1/2, clan level 2
/// - Paths: CLAN 1, WAR 2
/// - Territories (3): a, c, f
///
/// TERRITORIES:
/// - a [p1] warrior=4 (spawn)
/// - b [neutral] none (GOLD)
/// ...
/// ```
#[must_use]
pub fn render_text(state: &GameState) -> String {
    let mut output = String::new();

    render_header(&mut output, state);
    for player in &state.players {
        render_player(&mut output, player);
    }
    render_territories(&mut output, state);
    render_status(&mut output, state);

    output
}

fn render_header(output: &mut String, state: &GameState) {
    output.push_str(&format!(
        "=== MATCH {} | TURN {} | {} | current {} ===\n\n",
        state.id, state.turn, state.phase, state.current_player_id
    ));
}

fn render_player(output: &mut String, player: &Player) {
    output.push_str(&format!("PLAYER {} (seat {}):\n", player.id, player.seat));
    output.push_str(&format!(
        "- Gold: {}, actions {}/{}, clan level {}\n",
        player.gold, player.actions_left, player.actions, player.clan_level
    ));

    let paths: Vec<String> = crate::game::PathType::ALL
        .into_iter()
        .filter(|&path| player.path(path) > 0)
        .map(|path| format!("{path} {}", player.path(path)))
        .collect();
    if !paths.is_empty() {
        output.push_str(&format!("- Paths: {}\n", paths.join(", ")));
    }

    output.push_str(&format!(
        "- Territories ({}): {}\n\n",
        player.territory_count(),
        player.territories.join(", ")
    ));
}

fn render_territories(output: &mut String, state: &GameState) {
    output.push_str("TERRITORIES:\n");
    for territory in state.territories.values() {
        let owner = territory.owner_id.as_deref().unwrap_or("neutral");
        output.push_str(&format!("- {} [{owner}] {}", territory.id, territory.troops));
        if let Some(zone) = territory.zone {
            output.push_str(&format!(" ({zone})"));
        }
        if territory.is_spawn {
            output.push_str(" (spawn)");
        }
        if territory.reinforced {
            output.push_str(" +reinforced");
        }
        if territory.consolidated {
            output.push_str(" +consolidated");
        }
        output.push('\n');
    }
}

fn render_status(output: &mut String, state: &GameState) {
    output.push('\n');
    match &state.winner_id {
        Some(winner) => output.push_str(&format!("GAME OVER: {winner} wins\n")),
        None => output.push_str("IN PROGRESS\n"),
    }
}
