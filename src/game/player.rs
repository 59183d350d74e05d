//! Player state management.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::TerritoryId;

/// Unique identifier for a player within a match.
pub type PlayerId = String;

/// Highest level any path can reach.
pub const MAX_PATH_LEVEL: u8 = 3;

/// Hero chosen at match setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HeroType {
    /// Extra income per territory.
    Merchant,
    /// One extra action per turn.
    Leader,
    /// Attacker efficiency in every battle.
    Strategist,
    /// Three attacker rerolls in every battle.
    Master,
}

impl HeroType {
    /// All heroes in declaration order.
    pub const ALL: [HeroType; 4] = [
        HeroType::Merchant,
        HeroType::Leader,
        HeroType::Strategist,
        HeroType::Master,
    ];

    const fn name(self) -> &'static str {
        match self {
            HeroType::Merchant => "MERCHANT",
            HeroType::Leader => "LEADER",
            HeroType::Strategist => "STRATEGIST",
            HeroType::Master => "MASTER",
        }
    }
}

impl fmt::Display for HeroType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HeroType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HeroType::ALL
            .into_iter()
            .find(|hero| hero.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown hero '{s}'"))
    }
}

/// One of the six upgrade tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PathType {
    /// Raises clan level; level 3 grants an action.
    Clan,
    /// Income bonuses.
    Treasure,
    /// Unlocks higher ranks.
    Power,
    /// Rerolls and roll boosts.
    Luck,
    /// Cheaper units and extra free recruits.
    Land,
    /// Attacker efficiency, actions and chiefs.
    War,
}

impl PathType {
    /// All paths in declaration order.
    pub const ALL: [PathType; 6] = [
        PathType::Clan,
        PathType::Treasure,
        PathType::Power,
        PathType::Luck,
        PathType::Land,
        PathType::War,
    ];

    const fn index(self) -> usize {
        self as usize
    }

    const fn name(self) -> &'static str {
        match self {
            PathType::Clan => "CLAN",
            PathType::Treasure => "TREASURE",
            PathType::Power => "POWER",
            PathType::Luck => "LUCK",
            PathType::Land => "LAND",
            PathType::War => "WAR",
        }
    }
}

impl fmt::Display for PathType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PathType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PathType::ALL
            .into_iter()
            .find(|path| path.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown path '{s}'"))
    }
}

/// Level (0..=3) on each path. Serialized as a path-keyed map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<PathType, u8>", into = "BTreeMap<PathType, u8>")]
pub struct PathLevels {
    levels: [u8; 6],
}

impl PathLevels {
    /// Level on one path.
    #[must_use]
    pub const fn get(&self, path: PathType) -> u8 {
        self.levels[path.index()]
    }

    /// Set one path, clamped to [`MAX_PATH_LEVEL`].
    pub fn set(&mut self, path: PathType, level: u8) {
        self.levels[path.index()] = level.min(MAX_PATH_LEVEL);
    }
}

impl From<BTreeMap<PathType, u8>> for PathLevels {
    fn from(map: BTreeMap<PathType, u8>) -> Self {
        let mut levels = Self::default();
        for (path, level) in map {
            levels.set(path, level);
        }
        levels
    }
}

impl From<PathLevels> for BTreeMap<PathType, u8> {
    fn from(levels: PathLevels) -> Self {
        PathType::ALL
            .into_iter()
            .map(|path| (path, levels.get(path)))
            .collect()
    }
}

/// Lobby entry for one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSetup {
    /// Match-local player id.
    pub id: PlayerId,
    /// External account identity.
    pub user_id: String,
    /// Race selection; cosmetic to the rules.
    pub race: String,
    /// Hero selection.
    pub hero: Option<HeroType>,
}

impl PlayerSetup {
    /// Setup with no hero and a default race; `user_id` mirrors `id`.
    #[must_use]
    pub fn new(id: impl Into<PlayerId>) -> Self {
        let id = id.into();
        Self {
            user_id: id.clone(),
            id,
            race: "human".to_string(),
            hero: None,
        }
    }

    /// Set the hero.
    #[must_use]
    pub fn with_hero(mut self, hero: HeroType) -> Self {
        self.hero = Some(hero);
        self
    }
}

/// State for a single player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Match-local player id.
    pub id: PlayerId,
    /// External account identity.
    pub user_id: String,
    /// Turn order position, starting at 0.
    pub seat: usize,
    /// Race selection.
    pub race: String,
    /// Hero selection.
    pub hero: Option<HeroType>,
    /// Gold on hand.
    pub gold: u32,
    /// Action budget granted at the start of the turn.
    pub actions: i32,
    /// Actions still available this turn.
    pub actions_left: i32,
    /// Clan level (1..=3), derived from the CLAN path.
    pub clan_level: u8,
    /// Path levels.
    pub paths: PathLevels,
    /// Territories this player owns, in acquisition order.
    pub territories: Vec<TerritoryId>,
}

impl Player {
    /// Create a player from its lobby entry.
    #[must_use]
    pub fn new(setup: &PlayerSetup, seat: usize) -> Self {
        Self {
            id: setup.id.clone(),
            user_id: setup.user_id.clone(),
            seat,
            race: setup.race.clone(),
            hero: setup.hero,
            gold: 0,
            actions: 1,
            actions_left: 1,
            clan_level: 1,
            paths: PathLevels::default(),
            territories: Vec::new(),
        }
    }

    /// Level on one path.
    #[must_use]
    pub const fn path(&self, path: PathType) -> u8 {
        self.paths.get(path)
    }

    /// Whether the player has this hero.
    #[must_use]
    pub fn has_hero(&self, hero: HeroType) -> bool {
        self.hero == Some(hero)
    }

    /// Whether the player lists this territory.
    #[must_use]
    pub fn owns(&self, territory: &str) -> bool {
        self.territories.iter().any(|t| t == territory)
    }

    /// Record a gained territory.
    pub fn add_territory(&mut self, territory: TerritoryId) {
        if !self.owns(&territory) {
            self.territories.push(territory);
        }
    }

    /// Drop a lost territory.
    pub fn remove_territory(&mut self, territory: &str) {
        self.territories.retain(|t| t != territory);
    }

    /// Number of territories owned.
    #[must_use]
    pub fn territory_count(&self) -> usize {
        self.territories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_creation() {
        let setup = PlayerSetup::new("p1").with_hero(HeroType::Leader);
        let player = Player::new(&setup, 0);
        assert_eq!(player.id, "p1");
        assert_eq!(player.user_id, "p1");
        assert_eq!(player.clan_level, 1);
        assert!(player.has_hero(HeroType::Leader));
        assert_eq!(player.path(PathType::War), 0);
    }

    #[test]
    fn test_player_territories() {
        let mut player = Player::new(&PlayerSetup::new("p1"), 0);
        player.add_territory("t1".to_string());
        player.add_territory("t1".to_string());
        assert_eq!(player.territory_count(), 1);
        assert!(player.owns("t1"));

        player.remove_territory("t1");
        assert!(!player.owns("t1"));
    }

    #[test]
    fn test_path_levels_clamped() {
        let mut paths = PathLevels::default();
        paths.set(PathType::Luck, 7);
        assert_eq!(paths.get(PathType::Luck), MAX_PATH_LEVEL);
    }

    #[test]
    fn test_path_type_parse() {
        assert_eq!("treasure".parse::<PathType>().unwrap(), PathType::Treasure);
        assert_eq!(PathType::War.to_string(), "WAR");
        assert!("gold".parse::<PathType>().is_err());
    }

    #[test]
    fn test_hero_type_parse() {
        assert_eq!("Master".parse::<HeroType>().unwrap(), HeroType::Master);
        assert_eq!(HeroType::Merchant.to_string(), "MERCHANT");
        assert!("wizard".parse::<HeroType>().is_err());
    }
}
