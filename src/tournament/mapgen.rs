//! Deterministic map generation for tournaments.

// Map generation maps RNG draws onto small index ranges.
#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use thiserror::Error;

use crate::game::{RandomSource, TerritorySetup, ZoneType};

/// Fraction of non-spawn territories that carry a zone tag.
const ZONE_DENSITY: f64 = 0.4;

/// Error type for map generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MapGenError {
    /// Player count outside the supported range.
    #[error("need 2 to {max} players, got {players}")]
    PlayerCount {
        /// Requested players.
        players: usize,
        /// Supported maximum.
        max: usize,
    },
    /// Too few territories to give every player a spawn and leave room to expand.
    #[error("{territories} territories cannot seat {players} players")]
    TooSmall {
        /// Requested territories.
        territories: usize,
        /// Requested players.
        players: usize,
    },
}

/// Most players a generated map seats.
pub const MAX_PLAYERS: usize = 8;

/// Generate a map of `territories` entries with one spawn per player.
///
/// Ids are `t00`, `t01`, ... so their sorted order is generation order.
/// Spawns are spread evenly around the id ring from a random offset; other
/// territories get a random zone tag with probability [`ZONE_DENSITY`].
///
/// # Errors
///
/// [`MapGenError::PlayerCount`] outside `2..=8` players,
/// [`MapGenError::TooSmall`] unless there are at least two territories per player.
pub fn generate_map(
    seed: u32,
    territories: usize,
    players: usize,
) -> Result<Vec<TerritorySetup>, MapGenError> {
    if !(2..=MAX_PLAYERS).contains(&players) {
        return Err(MapGenError::PlayerCount {
            players,
            max: MAX_PLAYERS,
        });
    }
    if territories < players * 2 {
        return Err(MapGenError::TooSmall {
            territories,
            players,
        });
    }

    let mut rng = RandomSource::new(seed);
    let width = territories.to_string().len().max(2);
    let offset = rng.random_int(0, territories as i64 - 1) as usize;
    let spawns: Vec<usize> = (0..players)
        .map(|i| (offset + i * territories / players) % territories)
        .collect();

    let map = (0..territories)
        .map(|index| {
            let setup = TerritorySetup::new(format!("t{index:0width$}"));
            if spawns.contains(&index) {
                setup.spawn()
            } else if rng.random() < ZONE_DENSITY {
                let pick = rng.random_int(0, ZoneType::ALL.len() as i64 - 1) as usize;
                setup.with_zone(ZoneType::ALL[pick])
            } else {
                setup
            }
        })
        .collect();
    Ok(map)
}
