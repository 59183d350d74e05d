//! Match configuration.
//!
//! A [`GameConfig`] is resolved once per match and passed by reference to
//! every calculation. Each section has documented defaults; a partial JSON
//! document is merged over them field by field, so
//! `{"combat": {"damageThreshold": 10}}` changes one number and keeps the rest.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::game::Rank;

/// Fully-resolved configuration for one match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Income rules.
    pub economy: EconomyConfig,
    /// Zone bonuses.
    pub zones: ZonesConfig,
    /// Path upgrade costs and per-level tables.
    pub paths: PathsConfig,
    /// CLAN path thresholds for each clan level.
    pub clan_levels: ClanLevelsConfig,
    /// Base gold cost per rank.
    pub unit_costs: UnitCosts,
    /// Per-player unit caps.
    pub unit_limits: UnitLimits,
    /// Combat rules.
    pub combat: CombatRules,
    /// Die size per rank.
    pub rank_dice: RankDice,
    /// Match-level settings.
    pub game_settings: GameSettings,
}

impl GameConfig {
    /// Parse a (possibly partial) JSON document and merge it over the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] if the merged values fail [`GameConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`GameConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Check value ranges that the rules rely on.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for rank in Rank::ALL {
            if self.rank_dice.faces(rank) == 0 {
                return Err(ConfigError::invalid(
                    format!("rankDice.{rank}"),
                    "die must have at least one face",
                ));
            }
        }
        for (level, tier) in [
            (1, &self.paths.land.n1),
            (2, &self.paths.land.n2),
            (3, &self.paths.land.n3),
        ] {
            if !(0.0..1.0).contains(&tier.cost_reduction) {
                return Err(ConfigError::invalid(
                    format!("paths.land.n{level}.costReduction"),
                    "must be in [0, 1)",
                ));
            }
        }
        let settings = &self.game_settings;
        if settings.min_players == 0 || settings.min_players > settings.max_players {
            return Err(ConfigError::invalid(
                "gameSettings.minPlayers",
                "must be at least 1 and no more than maxPlayers",
            ));
        }
        if !(settings.victory_share > 0.0 && settings.victory_share <= 1.0) {
            return Err(ConfigError::invalid(
                "gameSettings.victoryShare",
                "must be in (0, 1]",
            ));
        }
        if settings.max_move_destinations == 0 {
            return Err(ConfigError::invalid(
                "gameSettings.maxMoveDestinations",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Income rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EconomyConfig {
    /// Gold per owned territory per turn.
    pub base_income_per_territory: u32,
    /// Extra gold per territory for a Merchant hero.
    pub merchant_hero_bonus: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            base_income_per_territory: 50,
            merchant_hero_bonus: 10,
        }
    }
}

/// Zone bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ZonesConfig {
    /// Flat gold per owned GOLD zone per turn.
    pub gold_income_bonus: u32,
    /// Free units per deployment into a RECRUITMENT zone.
    pub recruitment_free_units: u32,
    /// Extra actions for owning at least one FAST zone.
    pub fast_bonus_actions: i32,
    /// Added to every defender roll in a WALLED zone.
    pub walled_defense_bonus: u32,
    /// Per-side troop cap when fighting over a DEFENSIVE zone.
    pub defensive_max_troops: u32,
}

impl Default for ZonesConfig {
    fn default() -> Self {
        Self {
            gold_income_bonus: 50,
            recruitment_free_units: 1,
            fast_bonus_actions: 1,
            walled_defense_bonus: 2,
            defensive_max_troops: 10,
        }
    }
}

/// Path upgrade costs and the per-level tables that carry numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PathsConfig {
    /// Upgrading from level `n` costs `upgrade_cost_step * (n + 1)`.
    pub upgrade_cost_step: u32,
    /// TREASURE path income table.
    pub treasure: TreasurePath,
    /// LAND path cost-reduction table.
    pub land: LandPath,
    /// WAR path table.
    pub war: WarPath,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            upgrade_cost_step: 100,
            treasure: TreasurePath::default(),
            land: LandPath::default(),
            war: WarPath::default(),
        }
    }
}

/// TREASURE path: level bonuses stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreasurePath {
    /// Level 1: per-territory income.
    pub n1: TreasurePerTerritory,
    /// Level 2: flat income.
    pub n2: TreasureFlat,
    /// Level 3: additional flat income.
    pub n3: TreasureFlat,
}

impl Default for TreasurePath {
    fn default() -> Self {
        Self {
            n1: TreasurePerTerritory::default(),
            n2: TreasureFlat {
                flat_income_bonus: 50,
            },
            n3: TreasureFlat {
                flat_income_bonus: 100,
            },
        }
    }
}

/// Per-territory TREASURE bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreasurePerTerritory {
    /// Gold per owned territory.
    pub income_per_territory: u32,
}

impl Default for TreasurePerTerritory {
    fn default() -> Self {
        Self {
            income_per_territory: 10,
        }
    }
}

/// Flat TREASURE bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreasureFlat {
    /// Gold added once per turn.
    pub flat_income_bonus: u32,
}

impl Default for TreasureFlat {
    fn default() -> Self {
        Self {
            flat_income_bonus: 50,
        }
    }
}

/// LAND path: only the entry for the current level applies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandPath {
    /// Level 1 entry.
    pub n1: LandTier,
    /// Level 2 entry.
    pub n2: LandTier,
    /// Level 3 entry.
    pub n3: LandTier,
}

impl LandPath {
    /// Table entry for a path level; `None` for level 0.
    #[must_use]
    pub const fn tier(&self, level: u8) -> Option<&LandTier> {
        match level {
            0 => None,
            1 => Some(&self.n1),
            2 => Some(&self.n2),
            _ => Some(&self.n3),
        }
    }
}

impl Default for LandPath {
    fn default() -> Self {
        Self {
            n1: LandTier { cost_reduction: 0.1 },
            n2: LandTier { cost_reduction: 0.2 },
            n3: LandTier { cost_reduction: 0.3 },
        }
    }
}

/// One LAND level.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LandTier {
    /// Fraction taken off the base unit cost.
    pub cost_reduction: f64,
}

/// WAR path table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarPath {
    /// Level 3 entry.
    pub n3: WarTier,
}

/// WAR level 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WarTier {
    /// Chief cap at WAR level 3.
    pub max_chiefs: u32,
}

impl Default for WarTier {
    fn default() -> Self {
        Self { max_chiefs: 2 }
    }
}

/// CLAN path level required for each clan level above 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClanLevelsConfig {
    /// CLAN path level that grants clan level 2.
    pub level2: u8,
    /// CLAN path level that grants clan level 3.
    pub level3: u8,
}

impl ClanLevelsConfig {
    /// Clan level (1..=3) for a CLAN path level.
    #[must_use]
    pub const fn clan_level_for(&self, clan_path: u8) -> u8 {
        if clan_path >= self.level3 {
            3
        } else if clan_path >= self.level2 {
            2
        } else {
            1
        }
    }
}

impl Default for ClanLevelsConfig {
    fn default() -> Self {
        Self {
            level2: 1,
            level3: 2,
        }
    }
}

/// Base gold cost per rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnitCosts {
    /// Gold per EXPLORER.
    pub explorer: u32,
    /// Gold per WARRIOR.
    pub warrior: u32,
    /// Gold per ELITE.
    pub elite: u32,
    /// Gold per HERO.
    pub hero: u32,
    /// Gold per CHIEF.
    pub chief: u32,
    /// Gold per LEGEND.
    pub legend: u32,
}

impl UnitCosts {
    /// Base cost of one unit.
    #[must_use]
    pub const fn cost(&self, rank: Rank) -> u32 {
        match rank {
            Rank::Explorer => self.explorer,
            Rank::Warrior => self.warrior,
            Rank::Elite => self.elite,
            Rank::Hero => self.hero,
            Rank::Chief => self.chief,
            Rank::Legend => self.legend,
        }
    }
}

impl Default for UnitCosts {
    fn default() -> Self {
        Self {
            explorer: 100,
            warrior: 250,
            elite: 500,
            hero: 1000,
            chief: 1500,
            legend: 3000,
        }
    }
}

/// Per-player unit caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UnitLimits {
    /// Chiefs a player may field below WAR level 3.
    pub max_chiefs: u32,
}

impl Default for UnitLimits {
    fn default() -> Self {
        Self { max_chiefs: 1 }
    }
}

/// How a tie between rolls of different ranks is broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieRule {
    /// The rank with the larger die wins the tie.
    #[default]
    LargerDie,
    /// The defender wins every cross-rank tie.
    Defender,
}

/// Combat rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatRules {
    /// Pairing stops once accumulated damage reaches this value.
    pub damage_threshold: u32,
    /// Cross-rank tie breaking.
    pub tie_rule: TieRule,
    /// Count an attack on an empty garrison as a conquest.
    pub conquer_empty_territories: bool,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            damage_threshold: 8,
            tie_rule: TieRule::LargerDie,
            conquer_empty_territories: false,
        }
    }
}

/// Die face count per rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RankDice {
    /// EXPLORER die.
    pub explorer: u32,
    /// WARRIOR die.
    pub warrior: u32,
    /// ELITE die.
    pub elite: u32,
    /// HERO die.
    pub hero: u32,
    /// CHIEF die.
    pub chief: u32,
    /// LEGEND die.
    pub legend: u32,
}

impl RankDice {
    /// Faces on the die rolled for one unit of `rank`.
    #[must_use]
    pub const fn faces(&self, rank: Rank) -> u32 {
        match rank {
            Rank::Explorer => self.explorer,
            Rank::Warrior => self.warrior,
            Rank::Elite => self.elite,
            Rank::Hero => self.hero,
            Rank::Chief => self.chief,
            Rank::Legend => self.legend,
        }
    }
}

impl Default for RankDice {
    fn default() -> Self {
        Self {
            explorer: 4,
            warrior: 6,
            elite: 8,
            hero: 10,
            chief: 12,
            legend: 20,
        }
    }
}

/// Match-level settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameSettings {
    /// Seconds a player has per turn; enforced by the session layer.
    pub turn_time_seconds: u32,
    /// Fewest players a match can start with.
    pub min_players: usize,
    /// Most players a match can start with.
    pub max_players: usize,
    /// Gold each player starts with.
    pub starting_gold: u32,
    /// Warriors placed on each spawn territory.
    pub spawn_warriors: u32,
    /// A player wins once their territory count exceeds
    /// `floor(total * victory_share)`.
    pub victory_share: f64,
    /// Reject action-costing commands once `actions_left` reaches zero.
    pub enforce_action_budget: bool,
    /// Destinations allowed in one multi-move.
    pub max_move_destinations: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            turn_time_seconds: 90,
            min_players: 2,
            max_players: 6,
            starting_gold: 200,
            spawn_warriors: 3,
            victory_share: 0.5,
            enforce_action_budget: false,
            max_move_destinations: 3,
        }
    }
}
