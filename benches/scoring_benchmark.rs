//! Benchmarks for scoring and the challenge round path.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};
use geoduel::catalog::Difficulty;
use geoduel::challenge::ROUNDS_PER_CHALLENGE;
use geoduel::geo::haversine_km;
use geoduel::{Coordinate, Engine, EngineConfig, Location, MemoryCatalog, MemoryFriendGraph, Scorer};

fn bench_haversine(c: &mut Criterion) {
    let paris = Coordinate::new(48.8566, 2.3522).unwrap();
    let sydney = Coordinate::new(-33.8688, 151.2093).unwrap();

    c.bench_function("haversine", |b| {
        b.iter(|| black_box(haversine_km(black_box(paris), black_box(sydney))));
    });
}

fn bench_score(c: &mut Criterion) {
    let scorer = Scorer::default();
    let guesses: Vec<Coordinate> = (0..1000)
        .map(|i| Coordinate::new(f64::from(i % 180) - 90.0, f64::from(i % 360) - 180.0).unwrap())
        .collect();
    let actual = Coordinate::new(35.6762, 139.6503).unwrap();

    c.bench_function("score_1000_guesses", |b| {
        b.iter(|| {
            let total: u64 = guesses
                .iter()
                .map(|&g| u64::from(scorer.score(g, black_box(actual)).points))
                .sum();
            black_box(total)
        });
    });
}

fn bench_full_challenge(c: &mut Criterion) {
    let catalog = MemoryCatalog::new((1..=50u32).map(|id| Location {
        id: u64::from(id),
        coordinate: Coordinate::new(f64::from(id) - 25.0, f64::from(id) * 3.0).unwrap(),
        category: 1,
        difficulty: Difficulty::Medium,
        image: String::new(),
        country: None,
    }));
    let friends = Arc::new(MemoryFriendGraph::new());
    friends.befriend(1, 2).unwrap();
    let config = EngineConfig {
        seed: Some(42),
        ..EngineConfig::default()
    };
    let engine = Engine::in_memory(config, Arc::new(catalog), friends).unwrap();
    let challenges = engine.challenges();
    let guess = Coordinate::new(0.0, 0.0).unwrap();

    c.bench_function("challenge_lifecycle", |b| {
        b.iter(|| {
            let id = challenges.create(1, 2).unwrap().id;
            challenges.respond(id, 2, true).unwrap();
            challenges.start(id, 1).unwrap();
            for user in [1, 2] {
                for round in 1..=ROUNDS_PER_CHALLENGE {
                    black_box(challenges.submit_round_guess(id, user, round, guess).unwrap());
                }
            }
        });
    });
}

criterion_group!(benches, bench_haversine, bench_score, bench_full_challenge);
criterion_main!(benches);
