//! Unit ranks and per-territory troop pools.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of unit ranks.
pub const RANK_COUNT: usize = 6;

/// One of the six unit tiers, lowest first.
///
/// The declaration order is the value order: `Legend` is the most valuable
/// rank and is filled first when a side's commitment is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rank {
    /// Cheapest scouting unit.
    Explorer,
    /// Line infantry.
    Warrior,
    /// Veteran unit, unlocked by the POWER path.
    Elite,
    /// Hero unit, unlocked by POWER level 2.
    Hero,
    /// Commander; limited in number per player.
    Chief,
    /// Top tier, unlocked by POWER level 3.
    Legend,
}

impl Rank {
    /// All ranks in ascending order.
    pub const ALL: [Rank; RANK_COUNT] = [
        Rank::Explorer,
        Rank::Warrior,
        Rank::Elite,
        Rank::Hero,
        Rank::Chief,
        Rank::Legend,
    ];

    /// Position of this rank in [`Rank::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in CLI arguments and log output.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Rank::Explorer => "explorer",
            Rank::Warrior => "warrior",
            Rank::Elite => "elite",
            Rank::Hero => "hero",
            Rank::Chief => "chief",
            Rank::Legend => "legend",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .into_iter()
            .find(|rank| rank.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown rank '{s}'"))
    }
}

/// Per-rank unit counts at one location (or in one commitment).
///
/// Every rank is always present; absent ranks are zero. Serialized as a
/// rank-keyed map so commands and snapshots stay readable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Rank, u32>", into = "BTreeMap<Rank, u32>")]
pub struct Troops {
    counts: [u32; RANK_COUNT],
}

/// A fresh pool with every rank at zero.
#[must_use]
pub fn empty_troops() -> Troops {
    Troops::default()
}

/// Total number of units in a pool.
#[must_use]
pub fn sum_troops(troops: &Troops) -> u32 {
    troops.total()
}

impl Troops {
    /// Pool holding `count` units of a single rank.
    #[must_use]
    pub fn of(rank: Rank, count: u32) -> Self {
        let mut troops = Self::default();
        troops.set(rank, count);
        troops
    }

    /// Build a pool from `(rank, count)` pairs; repeated ranks accumulate.
    #[must_use]
    pub fn from_counts(pairs: &[(Rank, u32)]) -> Self {
        let mut troops = Self::default();
        for &(rank, count) in pairs {
            troops.add(rank, count);
        }
        troops
    }

    /// Count for one rank.
    #[must_use]
    pub const fn get(&self, rank: Rank) -> u32 {
        self.counts[rank.index()]
    }

    /// Overwrite the count for one rank.
    pub fn set(&mut self, rank: Rank, count: u32) {
        self.counts[rank.index()] = count;
    }

    /// Add units of one rank.
    pub fn add(&mut self, rank: Rank, count: u32) {
        let slot = &mut self.counts[rank.index()];
        *slot = slot.saturating_add(count);
    }

    /// Remove units of one rank, stopping at zero.
    pub fn remove_saturating(&mut self, rank: Rank, count: u32) {
        let slot = &mut self.counts[rank.index()];
        *slot = slot.saturating_sub(count);
    }

    /// Total unit count across ranks.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts.iter().fold(0u32, |acc, &c| acc.saturating_add(c))
    }

    /// Whether every rank is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Whether this pool holds at least `other` of every rank.
    #[must_use]
    pub fn contains(&self, other: &Troops) -> bool {
        self.counts
            .iter()
            .zip(other.counts.iter())
            .all(|(have, want)| have >= want)
    }

    /// Add another pool rank by rank.
    pub fn merge(&mut self, other: &Troops) {
        for rank in Rank::ALL {
            self.add(rank, other.get(rank));
        }
    }

    /// Remove another pool rank by rank, stopping each rank at zero.
    pub fn subtract_saturating(&mut self, other: &Troops) {
        for rank in Rank::ALL {
            self.remove_saturating(rank, other.get(rank));
        }
    }

    /// `self - other` if `self` contains `other`, otherwise `None`.
    #[must_use]
    pub fn checked_sub(&self, other: &Troops) -> Option<Troops> {
        if !self.contains(other) {
            return None;
        }
        let mut out = *self;
        out.subtract_saturating(other);
        Some(out)
    }

    /// Non-zero `(rank, count)` pairs in ascending rank order.
    pub fn iter(&self) -> impl Iterator<Item = (Rank, u32)> + '_ {
        Rank::ALL
            .into_iter()
            .map(|rank| (rank, self.get(rank)))
            .filter(|&(_, count)| count > 0)
    }

    /// Keep at most `cap` units, taking from the most valuable rank downward.
    #[must_use]
    pub fn capped(&self, cap: u32) -> Troops {
        let mut out = Troops::default();
        let mut remaining = cap;
        for rank in Rank::ALL.into_iter().rev() {
            if remaining == 0 {
                break;
            }
            let take = self.get(rank).min(remaining);
            out.set(rank, take);
            remaining -= take;
        }
        out
    }
}

impl From<BTreeMap<Rank, u32>> for Troops {
    fn from(map: BTreeMap<Rank, u32>) -> Self {
        let mut troops = Troops::default();
        for (rank, count) in map {
            troops.add(rank, count);
        }
        troops
    }
}

impl From<Troops> for BTreeMap<Rank, u32> {
    fn from(troops: Troops) -> Self {
        Rank::ALL
            .into_iter()
            .map(|rank| (rank, troops.get(rank)))
            .collect()
    }
}

impl fmt::Display for Troops {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (rank, count) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{rank}={count}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for Troops {
    type Err = String;

    /// Parse `"warrior=3,elite=1"`. An empty string is an empty pool.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut troops = Troops::default();
        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (rank, count) = part
                .split_once('=')
                .ok_or_else(|| format!("expected rank=count, got '{part}'"))?;
            let rank: Rank = rank.trim().parse()?;
            let count: u32 = count
                .trim()
                .parse()
                .map_err(|e| format!("bad count in '{part}': {e}"))?;
            troops.add(rank, count);
        }
        Ok(troops)
    }
}
