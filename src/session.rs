//! Live matches keyed by match id.
//!
//! The registry owns every [`GameFsm`]. It does no locking: the transport
//! layer must deliver at most one command per match at a time.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::GameConfig;
use crate::error::SessionError;
use crate::game::{Command, CommandOutcome, GameFsm, PlayerSetup, TerritorySetup};

/// Registry of active matches.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    matches: BTreeMap<String, GameFsm>,
}

impl SessionRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new lobby.
    ///
    /// # Errors
    ///
    /// [`SessionError::DuplicateMatch`] if `id` is taken.
    pub fn create(
        &mut self,
        id: &str,
        seed: u32,
        players: &[PlayerSetup],
        territories: &[TerritorySetup],
        config: GameConfig,
    ) -> Result<&mut GameFsm, SessionError> {
        if self.matches.contains_key(id) {
            return Err(SessionError::DuplicateMatch(id.to_string()));
        }
        info!(game = id, seed, players = players.len(), "match created");
        let fsm = GameFsm::new(id, seed, players, territories, config);
        Ok(self.matches.entry(id.to_string()).or_insert(fsm))
    }

    /// Look up a match.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&GameFsm> {
        self.matches.get(id)
    }

    /// Look up a match for mutation.
    #[must_use]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut GameFsm> {
        self.matches.get_mut(id)
    }

    /// Route a player command to its match.
    ///
    /// # Errors
    ///
    /// [`SessionError::UnknownMatch`], or [`SessionError::Game`] if the match
    /// rejects the command.
    pub fn apply(
        &mut self,
        match_id: &str,
        player_id: &str,
        command: Command,
    ) -> Result<CommandOutcome, SessionError> {
        let fsm = self
            .matches
            .get_mut(match_id)
            .ok_or_else(|| SessionError::UnknownMatch(match_id.to_string()))?;
        Ok(fsm.apply(player_id, command)?)
    }

    /// Drop a match, returning it.
    pub fn remove(&mut self, id: &str) -> Option<GameFsm> {
        let removed = self.matches.remove(id);
        if removed.is_some() {
            info!(game = id, "match removed");
        }
        removed
    }

    /// Ids of all registered matches, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.matches.keys().map(String::as_str)
    }

    /// Number of registered matches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether no match is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
