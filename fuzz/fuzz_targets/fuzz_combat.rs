#![no_main]

use arbitrary::Arbitrary;
use conquest::GameConfig;
use conquest::game::{CombatModifiers, RandomSource, Rank, Troops, resolve_combat};
use libfuzzer_sys::fuzz_target;

/// Structured input for combat fuzzing.
#[derive(Arbitrary, Debug)]
struct CombatInput {
    /// Committed attacker units per rank.
    attacker: [u8; 6],
    /// Committed defender units per rank.
    defender: [u8; 6],
    attacker_efficiency: bool,
    defender_efficiency: bool,
    attacker_rerolls: u8,
    defender_rerolls: u8,
    luck_boost_elites: bool,
    defender_defense_bonus: u8,
    defender_consolidated: bool,
    max_troops_per_side: Option<u8>,
    /// Overrides the damage threshold when set.
    damage_threshold: Option<u16>,
    conquer_empty: bool,
    seed: u32,
}

fn troops(counts: &[u8; 6]) -> Troops {
    // Keep battles small enough to stay fast
    let pairs: Vec<(Rank, u32)> = Rank::ALL
        .into_iter()
        .zip(counts.iter().map(|&c| u32::from(c % 32)))
        .collect();
    Troops::from_counts(&pairs)
}

fuzz_target!(|input: CombatInput| {
    let attacker = troops(&input.attacker);
    let defender = troops(&input.defender);

    let mut config = GameConfig::default();
    config.combat.conquer_empty_territories = input.conquer_empty;
    if let Some(threshold) = input.damage_threshold {
        config.combat.damage_threshold = u32::from(threshold);
    }

    let modifiers = CombatModifiers {
        attacker_efficiency: input.attacker_efficiency,
        defender_efficiency: input.defender_efficiency,
        attacker_rerolls: u32::from(input.attacker_rerolls % 4),
        defender_rerolls: u32::from(input.defender_rerolls % 4),
        luck_boost_elites: input.luck_boost_elites,
        defender_defense_bonus: u32::from(input.defender_defense_bonus % 8),
        defender_consolidated: input.defender_consolidated,
        max_troops_per_side: input.max_troops_per_side.map(u32::from),
    };

    let mut rng = RandomSource::new(input.seed);
    let result = resolve_combat(&attacker, &defender, &modifiers, &mut rng, &config);

    let (attacker, defender) = match modifiers.max_troops_per_side {
        Some(cap) => (attacker.capped(cap), defender.capped(cap)),
        None => (attacker, defender),
    };

    assert!(
        attacker.contains(&result.attacker_losses),
        "attacker lost {} out of {}",
        result.attacker_losses,
        attacker
    );

    // Consolidation rolls may charge the defender extra explorers
    let mut defender_budget = defender;
    if modifiers.defender_consolidated {
        defender_budget.add(Rank::Explorer, 2);
    }
    assert!(
        defender_budget.contains(&result.defender_losses),
        "defender lost {} out of {}",
        result.defender_losses,
        defender_budget
    );

    assert_eq!(result.attacker_rolls.len() as u32, attacker.total());
    for rolls in [&result.attacker_rolls, &result.defender_rolls] {
        assert!(rolls.windows(2).all(|pair| pair[0].value >= pair[1].value));
        assert!(rolls.iter().all(|roll| roll.value >= 1));
    }

    if defender.total() == 0 {
        assert_eq!(result.conquest, input.conquer_empty && attacker.total() > 0);
    } else if modifiers.defender_consolidated {
        // Consolidation losses never count, so conquest needs the full commit.
        if result.conquest {
            assert!(result.defender_losses.total() >= defender.total());
        }
    } else {
        assert_eq!(
            result.conquest,
            result.defender_losses.total() >= defender.total()
        );
    }
});
