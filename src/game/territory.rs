//! Territories and zone tags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::{PlayerId, Troops};

/// Unique identifier for a territory.
pub type TerritoryId = String;

/// Tag granting passive or combat bonuses to a territory's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneType {
    /// Flat income per turn.
    Gold,
    /// One extra action per turn.
    Fast,
    /// Defender efficiency.
    Battle,
    /// Defender roll bonus.
    Walled,
    /// Caps troops committed per side.
    Defensive,
    /// Free units on deployment.
    Recruitment,
}

impl ZoneType {
    /// All zone tags.
    pub const ALL: [ZoneType; 6] = [
        ZoneType::Gold,
        ZoneType::Fast,
        ZoneType::Battle,
        ZoneType::Walled,
        ZoneType::Defensive,
        ZoneType::Recruitment,
    ];

    /// Whether `use_zone` applies to this tag.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, ZoneType::Gold | ZoneType::Recruitment)
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZoneType::Gold => "GOLD",
            ZoneType::Fast => "FAST",
            ZoneType::Battle => "BATTLE",
            ZoneType::Walled => "WALLED",
            ZoneType::Defensive => "DEFENSIVE",
            ZoneType::Recruitment => "RECRUITMENT",
        };
        f.write_str(name)
    }
}

impl FromStr for ZoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneType::ALL
            .into_iter()
            .find(|zone| zone.to_string().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown zone '{s}'"))
    }
}

/// Map entry supplied when a match is created.
///
/// Adjacency is owned by the map-topology collaborator and is not part of
/// the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritorySetup {
    /// Territory id.
    pub id: TerritoryId,
    /// Optional zone tag.
    pub zone: Option<ZoneType>,
    /// Whether players may start here.
    pub is_spawn: bool,
}

impl TerritorySetup {
    /// Plain territory with no zone.
    #[must_use]
    pub fn new(id: impl Into<TerritoryId>) -> Self {
        Self {
            id: id.into(),
            zone: None,
            is_spawn: false,
        }
    }

    /// Mark as a spawn.
    #[must_use]
    pub fn spawn(mut self) -> Self {
        self.is_spawn = true;
        self
    }

    /// Tag with a zone.
    #[must_use]
    pub fn with_zone(mut self, zone: ZoneType) -> Self {
        self.zone = Some(zone);
        self
    }
}

/// Live state of one territory.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerritoryState {
    /// Territory id.
    pub id: TerritoryId,
    /// Owning player, if any.
    pub owner_id: Option<PlayerId>,
    /// Garrison.
    pub troops: Troops,
    /// Optional zone tag.
    pub zone: Option<ZoneType>,
    /// Whether players may start here.
    pub is_spawn: bool,
    /// +1 defender efficiency until the territory changes hands.
    pub reinforced: bool,
    /// Two extra EXPLORER defence rolls on the next defence.
    pub consolidated: bool,
    /// The zone was used this turn.
    pub zone_used: bool,
}

impl TerritoryState {
    /// Unowned, empty territory from its setup entry.
    #[must_use]
    pub fn new(setup: &TerritorySetup) -> Self {
        Self {
            id: setup.id.clone(),
            owner_id: None,
            troops: Troops::default(),
            zone: setup.zone,
            is_spawn: setup.is_spawn,
            reinforced: false,
            consolidated: false,
            zone_used: false,
        }
    }

    /// Whether `player` owns this territory.
    #[must_use]
    pub fn is_owned_by(&self, player: &str) -> bool {
        self.owner_id.as_deref() == Some(player)
    }

    /// Whether the zone tag equals `zone`.
    #[must_use]
    pub fn has_zone(&self, zone: ZoneType) -> bool {
        self.zone == Some(zone)
    }

    /// Hand the territory to a new owner, clearing transient flags.
    pub fn change_owner(&mut self, owner: Option<PlayerId>) {
        self.owner_id = owner;
        self.reinforced = false;
        self.consolidated = false;
        self.zone_used = false;
    }
}
