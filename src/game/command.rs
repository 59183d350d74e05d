//! Commands a player can send to a match.

use serde::{Deserialize, Serialize};

use crate::game::{PathType, TerritoryId, Troops};

/// One leg of a multi-destination move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movement {
    /// Origin territory.
    pub from_id: TerritoryId,
    /// Destination territory.
    pub to_id: TerritoryId,
    /// Units to move.
    pub troops: Troops,
}

/// A player command, validated and applied by [`GameFsm::apply`](crate::game::GameFsm::apply).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Command {
    /// Buy units and place them on an owned territory.
    Deploy {
        /// Target territory.
        territory_id: TerritoryId,
        /// Units requested, including any free units.
        troops: Troops,
    },
    /// Attack a neighbouring territory.
    Attack {
        /// Attacking territory.
        from_id: TerritoryId,
        /// Defending territory.
        to_id: TerritoryId,
        /// Units the attacker commits.
        attacker_commit: Troops,
        /// Units the defender commits.
        defender_commit: Troops,
    },
    /// Move units between two owned territories.
    Fortify {
        /// Origin territory.
        from_id: TerritoryId,
        /// Destination territory.
        to_id: TerritoryId,
        /// Units to move.
        troops: Troops,
    },
    /// Raise a path by one level.
    UpgradePath {
        /// Path to raise.
        path_type: PathType,
    },
    /// Mark a territory as reinforced.
    Reinforce {
        /// Target territory.
        territory_id: TerritoryId,
    },
    /// Mark a territory as consolidated.
    Consolidate {
        /// Target territory.
        territory_id: TerritoryId,
    },
    /// Use a territory's GOLD or RECRUITMENT zone.
    UseZone {
        /// Target territory.
        territory_id: TerritoryId,
    },
    /// Move units from one origin to several owned destinations.
    Move {
        /// Legs of the move, all from the same origin.
        movements: Vec<Movement>,
    },
    /// DEPLOY to ATTACK, or ATTACK to FORTIFY.
    AdvancePhase,
    /// Collect income and pass the turn.
    EndTurn,
}

impl Command {
    /// Short lowercase name for logs and error messages.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Command::Deploy { .. } => "deploy",
            Command::Attack { .. } => "attack",
            Command::Fortify { .. } => "fortify",
            Command::UpgradePath { .. } => "upgrade_path",
            Command::Reinforce { .. } => "reinforce",
            Command::Consolidate { .. } => "consolidate",
            Command::UseZone { .. } => "use_zone",
            Command::Move { .. } => "move",
            Command::AdvancePhase => "advance_phase",
            Command::EndTurn => "end_turn",
        }
    }

    /// Whether a successful command spends one action.
    #[must_use]
    pub const fn costs_action(&self) -> bool {
        !matches!(
            self,
            Command::UseZone { .. } | Command::AdvancePhase | Command::EndTurn
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Rank;

    #[test]
    fn test_command_json_shape() {
        let command = Command::Deploy {
            territory_id: "t1".to_string(),
            troops: Troops::of(Rank::Warrior, 2),
        };
        let json = serde_json::to_value(&command).unwrap();
        assert_eq!(json["type"], "DEPLOY");
        assert_eq!(json["territoryId"], "t1");
        assert_eq!(json["troops"]["WARRIOR"], 2);

        let back: Command = serde_json::from_value(json).unwrap();
        assert_eq!(back, command);
    }

    #[test]
    fn test_unit_commands_parse() {
        let command: Command = serde_json::from_str(r#"{"type":"END_TURN"}"#).unwrap();
        assert_eq!(command, Command::EndTurn);
        assert!(!command.costs_action());

        let command: Command =
            serde_json::from_str(r#"{"type":"UPGRADE_PATH","pathType":"LUCK"}"#).unwrap();
        assert_eq!(command.name(), "upgrade_path");
        assert!(command.costs_action());
    }
}
