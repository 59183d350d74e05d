// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Conquest: a deterministic rules engine for a turn-based territorial
//! conquest game.
//!
//! The engine is designed for:
//! - Bit-exact deterministic matches from a seed
//! - Validate-then-apply commands with typed rejections
//! - Replayable recordings
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Tournament Runner / Sessions      │
//! ├─────────────────────────────────────┤
//! │   Match FSM (phases, commands)      │
//! ├─────────────────────────────────────┤
//! │   Combat · Economy · Dice           │
//! └─────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod game;
pub mod replay;
pub mod session;
pub mod tournament;

pub use config::GameConfig;
pub use error::{CommandResult, ConfigError, GameError, SessionError};

// Re-export key game types at crate root for convenience
pub use game::{
    CombatResult, Command, CommandOutcome, GameFsm, GameState, Phase, Player, PlayerId, Rank,
    TerritoryId, Troops,
};
