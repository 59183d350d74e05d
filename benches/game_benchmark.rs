//! Benchmarks for running complete games.
//!
//! This benchmarks the full tournament game loop: bots, command application,
//! recording and per-turn invariant checks.

#![allow(missing_docs)]

use std::hint::black_box;

use conquest::config::GameConfig;
use conquest::tournament::{TournamentConfig, run_batch, run_game};
use criterion::{Criterion, criterion_group, criterion_main};

fn bench_single_game(c: &mut Criterion) {
    let config = TournamentConfig::default();
    let rules = GameConfig::default();

    c.bench_function("single_game_2p", |b| {
        b.iter(|| {
            let result = run_game(black_box(42), black_box(&config), black_box(&rules));
            black_box(result)
        });
    });
}

fn bench_single_game_4p(c: &mut Criterion) {
    let config = TournamentConfig {
        players: 4,
        territories: 32,
        ..TournamentConfig::default()
    };
    let rules = GameConfig::default();

    c.bench_function("single_game_4p", |b| {
        b.iter(|| {
            let result = run_game(black_box(42), black_box(&config), black_box(&rules));
            black_box(result)
        });
    });
}

fn bench_game_batch(c: &mut Criterion) {
    // Benchmark running 10 games sequentially (without parallel overhead)
    let config = TournamentConfig::default();
    let rules = GameConfig::default();

    c.bench_function("10_games_sequential", |b| {
        b.iter(|| {
            for seed in 0..10u32 {
                let result = run_game(black_box(seed), &config, &rules);
                let _ = black_box(result);
            }
        });
    });

    let seeds: Vec<u32> = (0..10).collect();
    c.bench_function("10_games_parallel", |b| {
        b.iter(|| black_box(run_batch(black_box(&seeds), &config, &rules)));
    });
}

fn bench_replay(c: &mut Criterion) {
    let Ok(result) = run_game(42, &TournamentConfig::default(), &GameConfig::default()) else {
        return;
    };
    let recording = result.recording;

    c.bench_function("replay_full_game", |b| {
        b.iter(|| black_box(recording.replay()));
    });
}

criterion_group!(
    benches,
    bench_single_game,
    bench_single_game_4p,
    bench_game_batch,
    bench_replay
);
criterion_main!(benches);
