//! Game invariants - sanity checks that detect bugs.
//!
//! These should NEVER trigger in a correctly implemented engine, whatever
//! commands are thrown at it. If they do, it indicates a bug.

use std::collections::BTreeMap;

use crate::config::GameConfig;
use crate::game::{GameState, MAX_PATH_LEVEL, PathType, Phase};

/// Sanity bound: units in one territory should never exceed this.
/// Gold buys units one action at a time, so even a very long game stays far below.
pub const SANITY_MAX_TROOPS_PER_TERRITORY: u32 = 1_000_000;

/// Invariant violation error.
#[derive(Debug, Clone)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

fn violation(message: String) -> InvariantViolation {
    InvariantViolation { message }
}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState, config: &GameConfig) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if state.phase != Phase::Lobby && state.current_player().is_none() {
        violations.push(violation(format!(
            "Current player {} does not exist",
            state.current_player_id
        )));
    }

    // Ownership consistency: territory owner <-> player list
    let mut listed: BTreeMap<&str, &str> = BTreeMap::new();
    for player in &state.players {
        for territory in &player.territories {
            if let Some(other) = listed.insert(territory.as_str(), player.id.as_str()) {
                violations.push(violation(format!(
                    "Territory {territory} listed by both {other} and {}",
                    player.id
                )));
            }
            match state.get_territory(territory) {
                None => violations.push(violation(format!(
                    "Player {} lists unknown territory {territory}",
                    player.id
                ))),
                Some(t) if !t.is_owned_by(&player.id) => violations.push(violation(format!(
                    "Player {} lists {territory} but its owner is {:?}",
                    player.id, t.owner_id
                ))),
                Some(_) => {}
            }
        }
    }

    for (id, territory) in &state.territories {
        if let Some(owner) = territory.owner_id.as_deref() {
            match state.get_player(owner) {
                None => violations.push(violation(format!(
                    "Territory {id} owned by unknown player {owner}"
                ))),
                Some(player) if !player.owns(id) => violations.push(violation(format!(
                    "Territory {id} owned by {owner} but missing from its list"
                ))),
                Some(_) => {}
            }
        }

        if territory.troops.total() > SANITY_MAX_TROOPS_PER_TERRITORY {
            violations.push(violation(format!(
                "Territory {id} holds {} units > sanity max {SANITY_MAX_TROOPS_PER_TERRITORY}",
                territory.troops.total()
            )));
        }
    }

    // Paths and clan levels
    for player in &state.players {
        for path in PathType::ALL {
            if player.path(path) > MAX_PATH_LEVEL {
                violations.push(violation(format!(
                    "Player {} has {path} level {} > {MAX_PATH_LEVEL}",
                    player.id,
                    player.path(path)
                )));
            }
        }
        let expected = config
            .clan_levels
            .clan_level_for(player.path(PathType::Clan));
        if player.clan_level != expected {
            violations.push(violation(format!(
                "Player {} clan level {} does not match CLAN path (expected {expected})",
                player.id, player.clan_level
            )));
        }
    }

    // Winner iff game over
    if state.is_game_over() != state.winner_id.is_some() {
        violations.push(violation(format!(
            "Phase {} with winner {:?}",
            state.phase, state.winner_id
        )));
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// Only active in debug builds. No-op in release builds.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
#[cfg(debug_assertions)]
pub fn assert_invariants(state: &GameState, config: &GameConfig) {
    let violations = check_invariants(state, config);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}

/// No-op in release builds.
#[cfg(not(debug_assertions))]
pub fn assert_invariants(_state: &GameState, _config: &GameConfig) {}
