#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use geoduel::catalog::Difficulty;
use geoduel::challenge::ROUNDS_PER_CHALLENGE;
use geoduel::{
    ChallengeStatus, Coordinate, Engine, EngineConfig, Location, MemoryCatalog, MemoryFriendGraph,
};
use libfuzzer_sys::fuzz_target;

/// One call against the challenge engine.
#[derive(Arbitrary, Debug)]
enum Op {
    Respond { caller: u8, accept: bool },
    Start { caller: u8 },
    Submit { caller: u8, round: u8, lat: i8, lon: i16 },
}

#[derive(Arbitrary, Debug)]
struct ChallengeInput {
    seed: u64,
    ops: Vec<Op>,
}

/// Users 1 and 2 are the players; anything else is an outsider.
fn user(raw: u8) -> u64 {
    u64::from(raw % 3) + 1
}

fuzz_target!(|input: ChallengeInput| {
    let catalog = MemoryCatalog::new((1..=8u32).map(|id| Location {
        id: u64::from(id),
        coordinate: Coordinate::new(f64::from(id) * 10.0, f64::from(id) * 20.0).expect("in range"),
        category: 1,
        difficulty: Difficulty::Hard,
        image: String::new(),
        country: None,
    }));
    let friends = Arc::new(MemoryFriendGraph::new());
    friends.befriend(1, 2).expect("friend graph");
    let config = EngineConfig {
        seed: Some(input.seed),
        ..EngineConfig::default()
    };
    let engine = Engine::in_memory(config, Arc::new(catalog), friends).expect("valid config");
    let challenges = engine.challenges();
    let id = challenges.create(1, 2).expect("challenge").id;

    let mut completions = 0;
    for op in input.ops.into_iter().take(64) {
        match op {
            Op::Respond { caller, accept } => {
                let _ = challenges.respond(id, user(caller), accept);
            }
            Op::Start { caller } => {
                let _ = challenges.start(id, user(caller));
            }
            Op::Submit { caller, round, lat, lon } => {
                let lat = f64::from(lat.clamp(-90, 90));
                let lon = f64::from(lon.clamp(-180, 180));
                let guess = Coordinate::new(lat, lon).expect("clamped");
                if let Ok(sub) = challenges.submit_round_guess(id, user(caller), round, guess) {
                    completions += usize::from(sub.completion.is_some());
                }
            }
        }

        let results = challenges.results(id, 1).expect("participant view");
        for player in &results.players {
            assert!(player.rounds.len() <= usize::from(ROUNDS_PER_CHALLENGE));
            let mut rounds: Vec<u8> = player.rounds.iter().map(|r| r.round).collect();
            rounds.dedup();
            assert_eq!(rounds.len(), player.rounds.len(), "duplicate round row");
        }
        assert_eq!(results.outcome.is_some(), results.status == ChallengeStatus::Completed);
    }
    assert!(completions <= 1);
});
