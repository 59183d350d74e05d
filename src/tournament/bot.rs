//! Seeded heuristic player for automated matches.
//!
//! The bot reads the public [`GameState`] and proposes one [`Command`] at a
//! time. It never mutates the match itself; the runner applies what it
//! proposes and falls back to `END_TURN` if the engine rejects it.

// Dice draws are mapped onto small index ranges.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use crate::config::GameConfig;
use crate::game::{
    Command, GameState, MAX_PATH_LEVEL, Movement, PathType, Phase, Player, RandomSource, Rank,
    TerritoryState, Troops, ZoneType, calculate_unit_cost, path_upgrade_cost,
};

/// Chance per DEPLOY step of spending on a path instead of units.
const UPGRADE_CHANCE: f64 = 0.35;

/// Gold kept back after an upgrade so the next deployment is still possible.
const UPGRADE_RESERVE: u32 = 100;

/// Most units bought in a single deployment.
const MAX_UNITS_PER_DEPLOY: u32 = 4;

/// Heuristic bot. One instance per seat.
#[derive(Debug, Clone)]
pub struct Bot {
    rng: RandomSource,
}

impl Bot {
    /// Create a bot with its own decision stream.
    #[must_use]
    pub const fn new(seed: u32) -> Self {
        Self {
            rng: RandomSource::new(seed),
        }
    }

    /// Propose the next command for the current player.
    #[must_use]
    pub fn next_command(&mut self, state: &GameState, config: &GameConfig) -> Command {
        let Some(player) = state.current_player() else {
            return Command::EndTurn;
        };
        if player.actions_left <= 0 {
            return Command::EndTurn;
        }
        match state.phase {
            Phase::Deploy => self.deploy_step(state, player, config),
            Phase::Attack => attack_step(state, player, config),
            Phase::Fortify => fortify_step(state, player, config),
            Phase::Lobby | Phase::GameOver => Command::EndTurn,
        }
    }

    fn deploy_step(&mut self, state: &GameState, player: &Player, config: &GameConfig) -> Command {
        let owned: Vec<&TerritoryState> = state.territories_owned_by(&player.id).collect();

        if let Some(zone) = owned
            .iter()
            .find(|t| t.has_zone(ZoneType::Gold) && !t.zone_used)
        {
            return Command::UseZone {
                territory_id: zone.id.clone(),
            };
        }

        // The last action goes to an attack whenever one is worth making.
        if player.actions_left == 1
            && matches!(attack_step(state, player, config), Command::Attack { .. })
        {
            return Command::AdvancePhase;
        }

        if self.rng.random() < UPGRADE_CHANCE
            && let Some(path_type) = self.pick_upgrade(player, config)
        {
            return Command::UpgradePath { path_type };
        }

        let Some(target) = strongest(&owned) else {
            return Command::AdvancePhase;
        };
        if let Some(troops) = affordable_troops(player, config) {
            return Command::Deploy {
                territory_id: target.id.clone(),
                troops,
            };
        }
        if !target.reinforced && self.rng.random() < 0.5 {
            return Command::Reinforce {
                territory_id: target.id.clone(),
            };
        }
        Command::AdvancePhase
    }

    fn pick_upgrade(&mut self, player: &Player, config: &GameConfig) -> Option<PathType> {
        let candidates: Vec<PathType> = PathType::ALL
            .into_iter()
            .filter(|&path| {
                let level = player.path(path);
                level < MAX_PATH_LEVEL
                    && path_upgrade_cost(level, config).saturating_add(UPGRADE_RESERVE)
                        <= player.gold
            })
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = self.rng.random_int(0, candidates.len() as i64 - 1) as usize;
        candidates.get(pick).copied()
    }
}

fn attack_step(state: &GameState, player: &Player, config: &GameConfig) -> Command {
    let owned: Vec<&TerritoryState> = state.territories_owned_by(&player.id).collect();
    let Some(source) = strongest(&owned) else {
        return Command::AdvancePhase;
    };
    let strength = source.troops.total();
    if strength == 0 {
        return Command::AdvancePhase;
    }

    let target = state
        .territories
        .values()
        .filter(|t| !t.is_owned_by(&player.id))
        .min_by_key(|t| t.troops.total());
    let Some(target) = target else {
        return Command::AdvancePhase;
    };

    let defenders = target.troops.total();
    let worthwhile = if defenders == 0 {
        config.combat.conquer_empty_territories
    } else {
        strength > defenders
    };
    if !worthwhile {
        return Command::AdvancePhase;
    }

    Command::Attack {
        from_id: source.id.clone(),
        to_id: target.id.clone(),
        attacker_commit: keep_one(&source.troops),
        defender_commit: target.troops,
    }
}

fn fortify_step(state: &GameState, player: &Player, config: &GameConfig) -> Command {
    let owned: Vec<&TerritoryState> = state.territories_owned_by(&player.id).collect();
    let Some(source) = strongest(&owned) else {
        return Command::EndTurn;
    };

    let empty: Vec<&TerritoryState> = owned
        .iter()
        .copied()
        .filter(|t| t.id != source.id && t.troops.is_empty())
        .take(config.game_settings.max_move_destinations)
        .collect();
    let units = spare_units(&source.troops, empty.len());

    match units.len() {
        0 => {}
        1 => {
            return Command::Fortify {
                from_id: source.id.clone(),
                to_id: empty[0].id.clone(),
                troops: units[0],
            };
        }
        _ => {
            let movements = empty
                .iter()
                .zip(units)
                .map(|(to, troops)| Movement {
                    from_id: source.id.clone(),
                    to_id: to.id.clone(),
                    troops,
                })
                .collect();
            return Command::Move { movements };
        }
    }

    match owned.iter().find(|t| !t.consolidated && !t.troops.is_empty()) {
        Some(territory) => Command::Consolidate {
            territory_id: territory.id.clone(),
        },
        None => Command::EndTurn,
    }
}

/// Owned territory with the most units; the first in id order on ties.
fn strongest<'a>(owned: &[&'a TerritoryState]) -> Option<&'a TerritoryState> {
    owned
        .iter()
        .copied()
        .rev()
        .max_by_key(|t| t.troops.total())
}

/// Warriors if affordable, otherwise explorers.
fn affordable_troops(player: &Player, config: &GameConfig) -> Option<Troops> {
    [Rank::Warrior, Rank::Explorer].into_iter().find_map(|rank| {
        let cost = calculate_unit_cost(rank, player, config).max(1);
        let count = (player.gold / cost).min(MAX_UNITS_PER_DEPLOY);
        (count > 0).then(|| Troops::of(rank, count))
    })
}

/// Everything except one unit of the lowest rank present.
fn keep_one(troops: &Troops) -> Troops {
    let mut commit = *troops;
    if troops.total() > 1
        && let Some((rank, _)) = troops.iter().next()
    {
        commit.remove_saturating(rank, 1);
    }
    commit
}

/// Up to `wanted` single units peeled off lowest rank first, always leaving one behind.
fn spare_units(troops: &Troops, wanted: usize) -> Vec<Troops> {
    let mut pool = *troops;
    let mut units = Vec::new();
    while units.len() < wanted && pool.total() > 1 {
        let Some((rank, _)) = pool.iter().next() else {
            break;
        };
        pool.remove_saturating(rank, 1);
        units.push(Troops::of(rank, 1));
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameFsm, PlayerSetup, TerritorySetup};

    fn started() -> GameFsm {
        let players = vec![PlayerSetup::new("p1"), PlayerSetup::new("p2")];
        let territories = vec![
            TerritorySetup::new("a").spawn(),
            TerritorySetup::new("b").spawn(),
            TerritorySetup::new("c"),
            TerritorySetup::new("d"),
        ];
        let mut config = GameConfig::default();
        config.combat.conquer_empty_territories = true;
        let mut fsm = GameFsm::new("bot", 5, &players, &territories, config);
        fsm.start_game().unwrap();
        fsm
    }

    #[test]
    fn test_keep_one() {
        let troops = Troops::from_counts(&[(Rank::Explorer, 1), (Rank::Warrior, 2)]);
        assert_eq!(keep_one(&troops), Troops::of(Rank::Warrior, 2));
        assert_eq!(keep_one(&Troops::of(Rank::Elite, 1)), Troops::of(Rank::Elite, 1));
    }

    #[test]
    fn test_spare_units_leaves_one() {
        let troops = Troops::from_counts(&[(Rank::Explorer, 1), (Rank::Warrior, 2)]);
        let units = spare_units(&troops, 5);
        assert_eq!(
            units,
            vec![Troops::of(Rank::Explorer, 1), Troops::of(Rank::Warrior, 1)]
        );
        assert!(spare_units(&Troops::of(Rank::Warrior, 1), 2).is_empty());
    }

    #[test]
    fn test_attacks_empty_territory_when_allowed() {
        let mut fsm = started();
        fsm.advance_phase().unwrap();
        let command = attack_step(
            fsm.state(),
            fsm.state().current_player().unwrap(),
            fsm.config(),
        );
        assert_eq!(
            command,
            Command::Attack {
                from_id: "a".to_string(),
                to_id: "c".to_string(),
                attacker_commit: Troops::of(Rank::Warrior, 2),
                defender_commit: Troops::default(),
            }
        );
        fsm.apply("p1", command).unwrap();
        assert!(fsm.state().get_territory("c").unwrap().is_owned_by("p1"));
    }

    #[test]
    fn test_fortify_spreads_to_empty_territories() {
        let mut fsm = started();
        fsm.advance_phase().unwrap();
        let attack = attack_step(fsm.state(), fsm.state().current_player().unwrap(), fsm.config());
        fsm.apply("p1", attack).unwrap();
        fsm.advance_phase().unwrap();

        let command = fortify_step(fsm.state(), fsm.state().current_player().unwrap(), fsm.config());
        assert!(matches!(command, Command::Fortify { .. } | Command::Consolidate { .. }));
        fsm.apply("p1", command).unwrap();
    }

    #[test]
    fn test_proposals_are_accepted() {
        let mut fsm = started();
        let mut bot = Bot::new(11);
        for _ in 0..40 {
            if fsm.state().is_game_over() {
                break;
            }
            let player = fsm.state().current_player_id.clone();
            let command = bot.next_command(fsm.state(), fsm.config());
            fsm.apply(&player, command).unwrap();
        }
    }
}
