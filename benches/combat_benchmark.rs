//! Benchmarks for combat resolution and the economy helpers it sits beside.

#![allow(missing_docs)]

use std::hint::black_box;

use conquest::config::GameConfig;
use conquest::game::{
    CombatModifiers, PathType, Player, PlayerSetup, RandomSource, Rank, Troops,
    calculate_unit_cost, resolve_combat,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn bench_small_battle(c: &mut Criterion) {
    let config = GameConfig::default();
    let attacker = Troops::of(Rank::Warrior, 3);
    let defender = Troops::of(Rank::Warrior, 2);
    let modifiers = CombatModifiers::default();

    c.bench_function("combat_3v2_warriors", |b| {
        let mut rng = RandomSource::new(12345);
        b.iter(|| {
            black_box(resolve_combat(
                black_box(&attacker),
                black_box(&defender),
                &modifiers,
                &mut rng,
                &config,
            ))
        });
    });
}

fn bench_army_sizes(c: &mut Criterion) {
    let config = GameConfig::default();
    let modifiers = CombatModifiers {
        attacker_rerolls: 3,
        defender_efficiency: true,
        defender_consolidated: true,
        ..CombatModifiers::default()
    };

    let mut group = c.benchmark_group("combat_mixed_army");
    for size in [1u32, 5, 20, 100] {
        let army = Troops::from_counts(&[
            (Rank::Explorer, size),
            (Rank::Warrior, size),
            (Rank::Elite, size),
            (Rank::Legend, size / 5),
        ]);
        group.bench_with_input(BenchmarkId::from_parameter(size), &army, |b, army| {
            let mut rng = RandomSource::new(7);
            b.iter(|| black_box(resolve_combat(army, army, &modifiers, &mut rng, &config)));
        });
    }
    group.finish();
}

fn bench_unit_cost(c: &mut Criterion) {
    let config = GameConfig::default();
    let mut player = Player::new(&PlayerSetup::new("p1"), 0);
    player.paths.set(PathType::Land, 2);

    c.bench_function("unit_cost_all_ranks", |b| {
        b.iter(|| {
            Rank::ALL
                .into_iter()
                .map(|rank| calculate_unit_cost(rank, black_box(&player), &config))
                .sum::<u32>()
        });
    });
}

criterion_group!(benches, bench_small_battle, bench_army_sizes, bench_unit_cost);
criterion_main!(benches);
