//! Rules engine.
//!
//! - Deterministic dice ([`RandomSource`])
//! - Troop pools by rank
//! - Players, paths and territories with zone tags
//! - Combat resolution
//! - Economy (income, unit costs, action budgets)
//! - The match state machine ([`GameFsm`])

mod combat;
mod command;
mod economy;
mod fsm;
pub mod invariants;
mod player;
mod rng;
mod state;
mod territory;
mod troops;

pub use combat::{CombatModifiers, CombatResult, CombatRoll, resolve_combat};
pub use command::{Command, Movement};
pub use economy::{
    calculate_actions, calculate_income, calculate_unit_cost, can_afford_unit, can_deploy_rank,
    get_chief_limit, path_upgrade_cost,
};
pub use fsm::{CommandOutcome, GameFsm, Snapshot, derive_modifiers};
pub use player::{HeroType, MAX_PATH_LEVEL, PathLevels, PathType, Player, PlayerId, PlayerSetup};
pub use rng::{Dice, RandomSource};
pub use state::{GameState, Phase};
pub use territory::{TerritoryId, TerritorySetup, TerritoryState, ZoneType};
pub use troops::{RANK_COUNT, Rank, Troops, empty_troops, sum_troops};
