//! Error types for the rules engine.

use thiserror::Error;

use crate::game::{PathType, Phase, PlayerId, Rank, TerritoryId, ZoneType};

/// A command was rejected. The game state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The command is not legal in the current phase.
    #[error("{action} is not allowed during the {phase} phase")]
    WrongPhase {
        /// Command that was attempted.
        action: &'static str,
        /// Phase the match is in.
        phase: Phase,
    },
    /// The match has ended.
    #[error("the game is over")]
    GameOver,
    /// The command came from a player whose turn it is not.
    #[error("it is not {player}'s turn")]
    NotYourTurn {
        /// Player that sent the command.
        player: PlayerId,
    },
    /// No territory with this id exists.
    #[error("unknown territory {0}")]
    UnknownTerritory(TerritoryId),
    /// No player with this id exists.
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    /// The acting player does not control the territory.
    #[error("territory {territory} is not owned by {player}")]
    NotOwner {
        /// Territory in question.
        territory: TerritoryId,
        /// Acting player.
        player: PlayerId,
    },
    /// Source and destination are the same territory.
    #[error("source and destination are both {0}")]
    SameTerritory(TerritoryId),
    /// Attack aimed at a territory the attacker already holds.
    #[error("cannot attack own territory {0}")]
    OwnTerritory(TerritoryId),
    /// More troops requested than are present.
    #[error("territory {territory} holds {available} {rank} but {requested} were requested")]
    InsufficientTroops {
        /// Territory the troops were taken from.
        territory: TerritoryId,
        /// First rank that fell short.
        rank: Rank,
        /// Units requested.
        requested: u32,
        /// Units present.
        available: u32,
    },
    /// The computed cost exceeds the player's gold.
    #[error("costs {required} gold but only {available} available")]
    InsufficientGold {
        /// Gold required.
        required: u32,
        /// Gold held.
        available: u32,
    },
    /// The rank has not been unlocked by the POWER path.
    #[error("{0} units are locked")]
    RankLocked(Rank),
    /// The path is already at level 3.
    #[error("{0} path is already at max level")]
    PathAtMaxLevel(PathType),
    /// Deploying would exceed the chief cap.
    #[error("chief limit exceeded: {current} fielded + {requested} requested > {limit}")]
    ChiefLimitExceeded {
        /// Chiefs already fielded.
        current: u32,
        /// Chiefs in this deployment.
        requested: u32,
        /// Cap for this player.
        limit: u32,
    },
    /// The action budget is spent and the match enforces it.
    #[error("no actions left this turn")]
    NoActionsLeft,
    /// The territory has no zone that can be used.
    #[error("territory {territory} has no usable zone ({zone:?})")]
    ZoneUnavailable {
        /// Territory in question.
        territory: TerritoryId,
        /// Its zone tag, if any.
        zone: Option<ZoneType>,
    },
    /// The zone was already used this turn.
    #[error("zone at {0} was already used this turn")]
    ZoneAlreadyUsed(TerritoryId),
    /// The territory is already reinforced.
    #[error("territory {0} is already reinforced")]
    AlreadyReinforced(TerritoryId),
    /// The territory is already consolidated.
    #[error("territory {0} is already consolidated")]
    AlreadyConsolidated(TerritoryId),
    /// A multi-move named too many (or zero) destinations.
    #[error("a move needs 1 to {max} destinations, got {requested}")]
    TooManyDestinations {
        /// Destinations in the command.
        requested: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// A multi-move drew from more than one origin.
    #[error("all movements must start at {expected}, found {found}")]
    MixedOrigins {
        /// Origin of the first movement.
        expected: TerritoryId,
        /// Conflicting origin.
        found: TerritoryId,
    },
    /// Player count outside the configured bounds.
    #[error("{count} players cannot start a match (allowed {min}..={max})")]
    InvalidPlayerCount {
        /// Players in the lobby.
        count: usize,
        /// Configured minimum.
        min: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Fewer spawn territories than players.
    #[error("{spawns} spawn territories for {players} players")]
    NotEnoughSpawns {
        /// Spawn territories on the map.
        spawns: usize,
        /// Players in the lobby.
        players: usize,
    },
}

/// Result alias for FSM commands.
pub type CommandResult<T> = Result<T, GameError>;

/// A session registry operation failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A match with this id is already registered.
    #[error("match {0} already exists")]
    DuplicateMatch(String),
    /// No match with this id is registered.
    #[error("unknown match {0}")]
    UnknownMatch(String),
    /// The match rejected the command.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The document is not valid JSON for the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is out of range.
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Offending field path.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Build an [`ConfigError::Invalid`].
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_error_display() {
        let err = GameError::WrongPhase {
            action: "deploy",
            phase: Phase::Attack,
        };
        assert_eq!(err.to_string(), "deploy is not allowed during the ATTACK phase");

        let err = GameError::InsufficientGold {
            required: 250,
            available: 200,
        };
        assert!(err.to_string().contains("250"));
    }

    #[test]
    fn test_config_error_invalid() {
        let err = ConfigError::invalid("combat.damageThreshold", "too small");
        assert_eq!(
            err.to_string(),
            "invalid config value combat.damageThreshold: too small"
        );
    }
}
