//! Game state management.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::game::{Player, PlayerId, PlayerSetup, TerritoryId, TerritorySetup, TerritoryState};

/// Phase of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Waiting for `start_game`.
    Lobby,
    /// Buying and placing units.
    Deploy,
    /// Fighting.
    Attack,
    /// Moving troops between own territories.
    Fortify,
    /// A winner has been decided. Terminal.
    GameOver,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Lobby => "LOBBY",
            Phase::Deploy => "DEPLOY",
            Phase::Attack => "ATTACK",
            Phase::Fortify => "FORTIFY",
            Phase::GameOver => "GAME_OVER",
        };
        f.write_str(name)
    }
}

/// Complete game state.
///
/// Players are kept in seat order; that order is the stable iteration order
/// used for turn rotation and the victory check. Territories are keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Match id.
    pub id: String,
    /// Seed the match's random source started from.
    pub seed: u32,
    /// Turn counter, 0 in the lobby and 1 on the first turn.
    pub turn: u32,
    /// Player whose turn it is.
    pub current_player_id: PlayerId,
    /// Current phase.
    pub phase: Phase,
    /// Players in seat order.
    pub players: Vec<Player>,
    /// Territories by id.
    pub territories: BTreeMap<TerritoryId, TerritoryState>,
    /// Winner once the phase is [`Phase::GameOver`].
    pub winner_id: Option<PlayerId>,
}

impl GameState {
    /// Create a lobby state from player and territory setups.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        seed: u32,
        players: &[PlayerSetup],
        territories: &[TerritorySetup],
    ) -> Self {
        let players: Vec<Player> = players
            .iter()
            .enumerate()
            .map(|(seat, setup)| Player::new(setup, seat))
            .collect();
        let territories = territories
            .iter()
            .map(|setup| (setup.id.clone(), TerritoryState::new(setup)))
            .collect();
        let current_player_id = players.first().map(|p| p.id.clone()).unwrap_or_default();

        Self {
            id: id.into(),
            seed,
            turn: 0,
            current_player_id,
            phase: Phase::Lobby,
            players,
            territories,
            winner_id: None,
        }
    }

    /// Get a player by id.
    #[must_use]
    pub fn get_player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Get a mutable reference to a player by id.
    #[must_use]
    pub fn get_player_mut(&mut self, id: &str) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The player whose turn it is.
    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.get_player(&self.current_player_id)
    }

    /// Get a territory by id.
    #[must_use]
    pub fn get_territory(&self, id: &str) -> Option<&TerritoryState> {
        self.territories.get(id)
    }

    /// Get a mutable reference to a territory by id.
    #[must_use]
    pub fn get_territory_mut(&mut self, id: &str) -> Option<&mut TerritoryState> {
        self.territories.get_mut(id)
    }

    /// Territories owned by `player`, in id order.
    pub fn territories_owned_by<'a>(
        &'a self,
        player: &'a str,
    ) -> impl Iterator<Item = &'a TerritoryState> + 'a {
        self.territories
            .values()
            .filter(move |t| t.is_owned_by(player))
    }

    /// Total number of territories on the map.
    #[must_use]
    pub fn total_territories(&self) -> usize {
        self.territories.len()
    }

    /// Id of the player seated after `player`, wrapping around.
    #[must_use]
    pub fn next_player_id(&self, player: &str) -> Option<PlayerId> {
        let seat = self.players.iter().position(|p| p.id == player)?;
        let next = (seat + 1) % self.players.len();
        Some(self.players[next].id.clone())
    }

    /// Whether the match has ended.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.phase == Phase::GameOver
    }

    /// Territory counts per player in seat order.
    #[must_use]
    pub fn territory_counts(&self) -> Vec<(PlayerId, usize)> {
        self.players
            .iter()
            .map(|p| (p.id.clone(), p.territory_count()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_state() -> GameState {
        let players = vec![PlayerSetup::new("a"), PlayerSetup::new("b"), PlayerSetup::new("c")];
        let territories = vec![
            TerritorySetup::new("t1").spawn(),
            TerritorySetup::new("t2"),
            TerritorySetup::new("t3").spawn(),
        ];
        GameState::new("match-1", 42, &players, &territories)
    }

    #[test]
    fn test_game_state_creation() {
        let state = create_test_state();
        assert_eq!(state.phase, Phase::Lobby);
        assert_eq!(state.turn, 0);
        assert_eq!(state.current_player_id, "a");
        assert_eq!(state.total_territories(), 3);
        assert_eq!(state.players[2].seat, 2);
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_next_player_wraps() {
        let state = create_test_state();
        assert_eq!(state.next_player_id("a").as_deref(), Some("b"));
        assert_eq!(state.next_player_id("c").as_deref(), Some("a"));
        assert_eq!(state.next_player_id("zzz"), None);
    }

    #[test]
    fn test_territories_owned_by() {
        let mut state = create_test_state();
        if let Some(t) = state.get_territory_mut("t2") {
            t.owner_id = Some("b".to_string());
        }
        let owned: Vec<_> = state.territories_owned_by("b").map(|t| t.id.as_str()).collect();
        assert_eq!(owned, vec!["t2"]);
        assert_eq!(state.territories_owned_by("a").count(), 0);
    }

    #[test]
    fn test_territory_counts_in_seat_order() {
        let mut state = create_test_state();
        state.get_player_mut("c").unwrap().add_territory("t1".to_string());
        state.get_player_mut("c").unwrap().add_territory("t3".to_string());
        assert_eq!(
            state.territory_counts(),
            vec![("a".to_string(), 0), ("b".to_string(), 0), ("c".to_string(), 2)]
        );
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::GameOver.to_string(), "GAME_OVER");
        assert_eq!(Phase::Deploy.to_string(), "DEPLOY");
    }
}
