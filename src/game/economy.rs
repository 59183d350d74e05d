//! Economy: income, unit costs, action budgets and unlock gating.
//!
//! Every function here is a pure function of a player (plus the territories
//! it owns) and the match configuration.
//!
//! # Income
//!
//! ```text
//! income = n * base
//!        + n * merchant_bonus            (Merchant hero)
//!        + gold_zones * gold_zone_bonus
//!        + n * treasure.n1               (TREASURE >= 1)
//!        + treasure.n2                   (TREASURE >= 2)
//!        + treasure.n3                   (TREASURE >= 3)
//! ```
//!
//! where `n` is the number of owned territories.

// Cost reduction is a fractional multiplier floored back to whole gold.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]

use crate::config::GameConfig;
use crate::game::{HeroType, PathType, Player, Rank, TerritoryState, ZoneType};

/// Gold a player earns at the end of their turn.
#[must_use]
pub fn calculate_income<'a, I>(player: &Player, territories: I, config: &GameConfig) -> u32
where
    I: IntoIterator<Item = &'a TerritoryState>,
{
    let mut count = 0u32;
    let mut gold_zones = 0u32;
    for territory in territories {
        count += 1;
        if territory.has_zone(ZoneType::Gold) {
            gold_zones += 1;
        }
    }

    let mut income = count.saturating_mul(config.economy.base_income_per_territory);

    if player.has_hero(HeroType::Merchant) {
        income = income.saturating_add(count.saturating_mul(config.economy.merchant_hero_bonus));
    }

    income = income.saturating_add(gold_zones.saturating_mul(config.zones.gold_income_bonus));

    let treasure = player.path(PathType::Treasure);
    let table = &config.paths.treasure;
    if treasure >= 1 {
        income = income.saturating_add(count.saturating_mul(table.n1.income_per_territory));
    }
    if treasure >= 2 {
        income = income.saturating_add(table.n2.flat_income_bonus);
    }
    if treasure >= 3 {
        income = income.saturating_add(table.n3.flat_income_bonus);
    }

    income
}

/// Cost of one unit of `rank` for this player.
///
/// LAND level `n >= 1` multiplies the base cost by `1 - land.n<n>.cost_reduction`
/// and floors the result. Only the current level's entry applies.
#[must_use]
pub fn calculate_unit_cost(rank: Rank, player: &Player, config: &GameConfig) -> u32 {
    let base = config.unit_costs.cost(rank);
    match config.paths.land.tier(player.path(PathType::Land)) {
        Some(tier) => (f64::from(base) * (1.0 - tier.cost_reduction)).floor() as u32,
        None => base,
    }
}

/// Actions granted per turn, before zone bonuses.
///
/// Base 1, +1 for a Leader hero, +1 at CLAN 3, +1 at WAR 2 or higher.
#[must_use]
pub fn calculate_actions(player: &Player, _config: &GameConfig) -> i32 {
    let mut actions = 1;
    if player.has_hero(HeroType::Leader) {
        actions += 1;
    }
    if player.path(PathType::Clan) >= 3 {
        actions += 1;
    }
    if player.path(PathType::War) >= 2 {
        actions += 1;
    }
    actions
}

/// Whether the player can pay for `count` units of `rank`.
#[must_use]
pub fn can_afford_unit(player: &Player, rank: Rank, count: u32, config: &GameConfig) -> bool {
    u64::from(player.gold) >= u64::from(calculate_unit_cost(rank, player, config)) * u64::from(count)
}

/// Whether the POWER path has unlocked `rank`.
#[must_use]
pub fn can_deploy_rank(player: &Player, rank: Rank) -> bool {
    let power = player.path(PathType::Power);
    match rank {
        Rank::Explorer | Rank::Warrior | Rank::Chief => true,
        Rank::Elite => power >= 1,
        Rank::Hero => power >= 2,
        Rank::Legend => power >= 3,
    }
}

/// Maximum chiefs the player may field.
#[must_use]
pub fn get_chief_limit(player: &Player, config: &GameConfig) -> u32 {
    if player.path(PathType::War) >= 3 {
        config.paths.war.n3.max_chiefs
    } else {
        config.unit_limits.max_chiefs
    }
}

/// Gold needed to raise `path` from `current_level` by one.
#[must_use]
pub fn path_upgrade_cost(current_level: u8, config: &GameConfig) -> u32 {
    config
        .paths
        .upgrade_cost_step
        .saturating_mul(u32::from(current_level) + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{PlayerSetup, TerritorySetup};

    fn player() -> Player {
        Player::new(&PlayerSetup::new("p1"), 0)
    }

    fn territories(n: usize, gold: usize) -> Vec<TerritoryState> {
        (0..n)
            .map(|i| {
                let mut setup = TerritorySetup::new(format!("t{i}"));
                if i < gold {
                    setup = setup.with_zone(ZoneType::Gold);
                }
                TerritoryState::new(&setup)
            })
            .collect()
    }

    #[test]
    fn test_base_income() {
        let config = GameConfig::default();
        let income = calculate_income(&player(), &territories(3, 0), &config);
        assert_eq!(income, 150);
    }

    #[test]
    fn test_income_merchant_and_gold_zone() {
        let config = GameConfig::default();
        let mut p = player();
        p.hero = Some(HeroType::Merchant);
        // 2 * 50 + 2 * 10 + 1 * 50
        assert_eq!(calculate_income(&p, &territories(2, 1), &config), 170);
    }

    #[test]
    fn test_treasure_tiers_cumulative() {
        let config = GameConfig::default();
        let mut p = player();
        let owned = territories(4, 0);

        p.paths.set(PathType::Treasure, 1);
        assert_eq!(calculate_income(&p, &owned, &config), 200 + 40);

        p.paths.set(PathType::Treasure, 2);
        assert_eq!(calculate_income(&p, &owned, &config), 200 + 40 + 50);

        p.paths.set(PathType::Treasure, 3);
        assert_eq!(calculate_income(&p, &owned, &config), 200 + 40 + 50 + 100);
    }

    #[test]
    fn test_unit_cost_land_reduction() {
        let config = GameConfig::default();
        let mut p = player();
        assert_eq!(calculate_unit_cost(Rank::Warrior, &p, &config), 250);

        p.paths.set(PathType::Land, 1);
        assert_eq!(calculate_unit_cost(Rank::Warrior, &p, &config), 225);

        // Only the level-2 entry applies, not 10% + 20%.
        p.paths.set(PathType::Land, 2);
        assert_eq!(calculate_unit_cost(Rank::Warrior, &p, &config), 200);
    }

    #[test]
    fn test_unit_cost_floors() {
        let mut config = GameConfig::default();
        config.unit_costs.explorer = 99;
        let mut p = player();
        p.paths.set(PathType::Land, 1);
        // 99 * 0.9 = 89.1
        assert_eq!(calculate_unit_cost(Rank::Explorer, &p, &config), 89);
    }

    #[test]
    fn test_actions() {
        let config = GameConfig::default();
        let mut p = player();
        assert_eq!(calculate_actions(&p, &config), 1);

        p.paths.set(PathType::War, 3);
        assert_eq!(calculate_actions(&p, &config), 2);

        p.hero = Some(HeroType::Leader);
        p.paths.set(PathType::Clan, 3);
        assert_eq!(calculate_actions(&p, &config), 4);
    }

    #[test]
    fn test_can_afford() {
        let config = GameConfig::default();
        let mut p = player();
        p.gold = 500;
        assert!(can_afford_unit(&p, Rank::Warrior, 2, &config));
        assert!(!can_afford_unit(&p, Rank::Warrior, 3, &config));
        assert!(can_afford_unit(&p, Rank::Legend, 0, &config));
    }

    #[test]
    fn test_rank_gating() {
        let mut p = player();
        assert!(can_deploy_rank(&p, Rank::Explorer));
        assert!(can_deploy_rank(&p, Rank::Warrior));
        assert!(can_deploy_rank(&p, Rank::Chief));
        assert!(!can_deploy_rank(&p, Rank::Elite));

        p.paths.set(PathType::Power, 2);
        assert!(can_deploy_rank(&p, Rank::Elite));
        assert!(can_deploy_rank(&p, Rank::Hero));
        assert!(!can_deploy_rank(&p, Rank::Legend));

        p.paths.set(PathType::Power, 3);
        assert!(can_deploy_rank(&p, Rank::Legend));
    }

    #[test]
    fn test_chief_limit() {
        let config = GameConfig::default();
        let mut p = player();
        assert_eq!(get_chief_limit(&p, &config), 1);
        p.paths.set(PathType::War, 2);
        assert_eq!(get_chief_limit(&p, &config), 1);
        p.paths.set(PathType::War, 3);
        assert_eq!(get_chief_limit(&p, &config), 2);
    }

    #[test]
    fn test_path_upgrade_cost() {
        let config = GameConfig::default();
        assert_eq!(path_upgrade_cost(0, &config), 100);
        assert_eq!(path_upgrade_cost(2, &config), 300);
    }
}
