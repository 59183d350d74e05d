//! Combat resolution.
//!
//! One die per committed unit, sized by rank. Both sides' rolls are sorted
//! high to low and compared pairwise; the lower roll of each pair loses a
//! unit of its rank. Pairing stops early once the accumulated damage (the
//! sum of winning roll values) reaches the configured threshold, so large
//! battles are decided a few dice at a time.
//!
//! Dice are drawn in a fixed order: attacker units from EXPLORER up to
//! LEGEND (with each unit's rerolls immediately after it), then defender
//! units in the same order, then the two consolidation rolls. Changing that
//! order changes every replay.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::{GameConfig, TieRule};
use crate::game::{Dice, Rank, Troops};

/// Situational adjustments applied to one battle.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CombatModifiers {
    /// +1 to every attacker roll, capped at the die's max face.
    pub attacker_efficiency: bool,
    /// +1 to every defender roll, capped at the die's max face.
    pub defender_efficiency: bool,
    /// Extra rolls per attacker unit; the best roll is kept.
    pub attacker_rerolls: u32,
    /// Extra rolls per defender unit; the best roll is kept.
    pub defender_rerolls: u32,
    /// +1 to attacker ELITE rolls, capped at the die's max face.
    pub luck_boost_elites: bool,
    /// Added to every defender roll, capped at the die's max face.
    pub defender_defense_bonus: u32,
    /// Defender gets two extra EXPLORER rolls.
    pub defender_consolidated: bool,
    /// Cap on units committed per side, filled from the highest rank down.
    pub max_troops_per_side: Option<u32>,
}

/// One die result tagged with the rank that rolled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRoll {
    /// Rank of the unit.
    pub rank: Rank,
    /// Final value after adjustments and rerolls.
    pub value: u32,
}

/// Outcome of one battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatResult {
    /// Attacker rolls, highest first.
    pub attacker_rolls: Vec<CombatRoll>,
    /// Defender rolls, highest first.
    pub defender_rolls: Vec<CombatRoll>,
    /// Units the attacker lost, by rank.
    pub attacker_losses: Troops,
    /// Units the defender lost, by rank.
    pub defender_losses: Troops,
    /// The defending garrison was eliminated.
    pub conquest: bool,
    /// Sum of winning roll values over the resolved pairs.
    pub total_damage: u32,
}

/// Per-side roll adjustments.
#[derive(Debug, Clone, Copy)]
struct RollAdjust {
    efficiency: bool,
    elite_boost: bool,
    bonus: u32,
    rerolls: u32,
}

impl RollAdjust {
    fn apply(self, raw: u32, rank: Rank, faces: u32) -> u32 {
        let mut value = raw;
        if self.efficiency {
            value = value.saturating_add(1).min(faces);
        }
        if self.elite_boost && rank == Rank::Elite {
            value = value.saturating_add(1).min(faces);
        }
        if self.bonus > 0 {
            value = value.saturating_add(self.bonus).min(faces);
        }
        value
    }
}

/// Roll for one unit, keeping the best of `1 + rerolls` adjusted rolls.
fn roll_unit<D: Dice + ?Sized>(rng: &mut D, rank: Rank, faces: u32, adjust: RollAdjust) -> u32 {
    let mut best = adjust.apply(rng.roll_dice(faces), rank, faces);
    for _ in 0..adjust.rerolls {
        best = best.max(adjust.apply(rng.roll_dice(faces), rank, faces));
    }
    best
}

fn roll_side<D: Dice + ?Sized>(
    rng: &mut D,
    troops: &Troops,
    adjust: RollAdjust,
    config: &GameConfig,
) -> Vec<CombatRoll> {
    let mut rolls = Vec::with_capacity(troops.total() as usize);
    for (rank, count) in troops.iter() {
        let faces = config.rank_dice.faces(rank);
        for _ in 0..count {
            let value = roll_unit(rng, rank, faces, adjust);
            rolls.push(CombatRoll { rank, value });
        }
    }
    rolls
}

/// Which side loses a unit when a pair is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairOutcome {
    AttackerWins,
    DefenderWins,
    BothLose,
}

fn compare_pair(attacker: CombatRoll, defender: CombatRoll, config: &GameConfig) -> PairOutcome {
    match attacker.value.cmp(&defender.value) {
        Ordering::Greater => PairOutcome::AttackerWins,
        Ordering::Less => PairOutcome::DefenderWins,
        Ordering::Equal => {
            let attacker_faces = config.rank_dice.faces(attacker.rank);
            let defender_faces = config.rank_dice.faces(defender.rank);
            if attacker.rank == defender.rank || attacker_faces == defender_faces {
                return PairOutcome::BothLose;
            }
            match config.combat.tie_rule {
                TieRule::LargerDie if attacker_faces > defender_faces => PairOutcome::AttackerWins,
                TieRule::LargerDie | TieRule::Defender => PairOutcome::DefenderWins,
            }
        }
    }
}

/// Resolve one attack.
///
/// `attacker` and `defender` are the committed troops. The returned losses
/// never exceed what each side rolled for; the defender may additionally be
/// charged EXPLORER losses from consolidation rolls. Conquest needs every
/// committed defender to fall; consolidation losses do not count.
pub fn resolve_combat<D: Dice + ?Sized>(
    attacker: &Troops,
    defender: &Troops,
    modifiers: &CombatModifiers,
    rng: &mut D,
    config: &GameConfig,
) -> CombatResult {
    let (attacker, defender) = match modifiers.max_troops_per_side {
        Some(cap) => (attacker.capped(cap), defender.capped(cap)),
        None => (*attacker, *defender),
    };

    let attacker_adjust = RollAdjust {
        efficiency: modifiers.attacker_efficiency,
        elite_boost: modifiers.luck_boost_elites,
        bonus: 0,
        rerolls: modifiers.attacker_rerolls,
    };
    let defender_adjust = RollAdjust {
        efficiency: modifiers.defender_efficiency,
        elite_boost: false,
        bonus: modifiers.defender_defense_bonus,
        rerolls: modifiers.defender_rerolls,
    };

    let mut attacker_rolls = roll_side(rng, &attacker, attacker_adjust, config);
    // Defender rolls paired with whether they come from consolidation.
    let mut defender_pool: Vec<(CombatRoll, bool)> =
        roll_side(rng, &defender, defender_adjust, config)
            .into_iter()
            .map(|roll| (roll, false))
            .collect();
    if modifiers.defender_consolidated {
        let faces = config.rank_dice.faces(Rank::Explorer);
        for _ in 0..2 {
            let value = roll_unit(rng, Rank::Explorer, faces, defender_adjust);
            let roll = CombatRoll {
                rank: Rank::Explorer,
                value,
            };
            defender_pool.push((roll, true));
        }
    }

    attacker_rolls.sort_by(|a, b| b.value.cmp(&a.value));
    defender_pool.sort_by(|(a, _), (b, _)| b.value.cmp(&a.value));

    let mut attacker_losses = Troops::default();
    let mut defender_losses = Troops::default();
    let mut garrison_losses = 0u32;
    let mut total_damage = 0u32;

    for (&a, &(d, extra)) in attacker_rolls.iter().zip(defender_pool.iter()) {
        if total_damage >= config.combat.damage_threshold {
            break;
        }
        let outcome = compare_pair(a, d, config);
        trace!(
            attacker_rank = %a.rank,
            attacker_roll = a.value,
            defender_rank = %d.rank,
            defender_roll = d.value,
            consolidation = extra,
            ?outcome,
            "combat pair"
        );
        let defender_falls = match outcome {
            PairOutcome::AttackerWins => {
                total_damage = total_damage.saturating_add(a.value);
                true
            }
            PairOutcome::DefenderWins => {
                attacker_losses.add(a.rank, 1);
                total_damage = total_damage.saturating_add(d.value);
                false
            }
            PairOutcome::BothLose => {
                attacker_losses.add(a.rank, 1);
                true
            }
        };
        if defender_falls {
            defender_losses.add(d.rank, 1);
            if !extra {
                garrison_losses += 1;
            }
        }
    }

    // Consolidation rolls are not garrison units and never count toward conquest.
    let committed = defender.total();
    let conquest = if committed == 0 {
        config.combat.conquer_empty_territories && attacker.total() > 0
    } else {
        garrison_losses >= committed
    };
    let defender_rolls = defender_pool.into_iter().map(|(roll, _)| roll).collect();

    CombatResult {
        attacker_rolls,
        defender_rolls,
        attacker_losses,
        defender_losses,
        conquest,
        total_damage,
    }
}
