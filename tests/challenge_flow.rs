//! End-to-end scenarios for challenges and solo sessions.
//!
//! Run with: cargo test challenge_flow

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use geoduel::catalog::Difficulty;
use geoduel::challenge::ROUNDS_PER_CHALLENGE;
use geoduel::session::SessionStatus;
use geoduel::stats::{leaderboard, player_records};
use geoduel::{
    CategoryFilter, ChallengeOutcome, ChallengeStatus, Coordinate, Engine, EngineConfig, EngineError,
    Location, MemoryCatalog, MemoryFriendGraph,
};

const ALICE: u64 = 1;
const BOB: u64 = 2;
const CAROL: u64 = 3;

fn catalog() -> MemoryCatalog {
    let cities = [
        (48.8566, 2.3522, 1, "FR"),
        (51.5074, -0.1278, 1, "GB"),
        (40.7128, -74.0060, 2, "US"),
        (35.6762, 139.6503, 2, "JP"),
        (-33.8688, 151.2093, 3, "AU"),
        (-22.9068, -43.1729, 3, "BR"),
        (55.7558, 37.6173, 1, "RU"),
        (1.3521, 103.8198, 2, "SG"),
    ];
    MemoryCatalog::new(cities.iter().zip(1..).map(|(&(lat, lon, category, country), id)| Location {
        id,
        coordinate: Coordinate::new(lat, lon).unwrap(),
        category,
        difficulty: Difficulty::Medium,
        image: format!("img/{id}.jpg"),
        country: Some(country.to_string()),
    }))
}

fn engine() -> Engine {
    let friends = Arc::new(MemoryFriendGraph::new());
    friends.befriend(ALICE, BOB).unwrap();
    let config = EngineConfig {
        seed: Some(2024),
        ..EngineConfig::default()
    };
    Engine::in_memory(config, Arc::new(catalog()), friends).unwrap()
}

/// Submit every round for `user`, guessing `offset_deg` north of the target.
fn play_all(engine: &Engine, id: u64, user: u64, offset_deg: f64) -> Vec<Option<ChallengeOutcome>> {
    (1..=ROUNDS_PER_CHALLENGE)
        .map(|round| {
            let actual = engine.challenges().location_for_round(id, user, round).unwrap();
            let lat = (actual.coordinate.latitude() + offset_deg).clamp(-90.0, 90.0);
            let guess = Coordinate::new(lat, actual.coordinate.longitude()).unwrap();
            engine
                .challenges()
                .submit_round_guess(id, user, round, guess)
                .unwrap()
                .completion
                .map(|c| c.outcome)
        })
        .collect()
}

#[test]
fn test_closer_player_wins() {
    let engine = engine();
    let challenge = engine.challenges().create(ALICE, BOB).unwrap();
    assert_eq!(challenge.status, ChallengeStatus::Pending);
    assert_eq!(challenge.locations.len(), 5);

    engine.challenges().respond(challenge.id, BOB, true).unwrap();
    engine.challenges().start(challenge.id, ALICE).unwrap();

    let alice = play_all(&engine, challenge.id, ALICE, 0.5);
    assert!(alice.iter().all(Option::is_none));
    let bob = play_all(&engine, challenge.id, BOB, 5.0);
    assert_eq!(bob.iter().flatten().count(), 1);
    assert_eq!(bob[4], Some(ChallengeOutcome::Winner(ALICE)));

    let results = engine.challenges().results(challenge.id, BOB).unwrap();
    assert_eq!(results.status, ChallengeStatus::Completed);
    assert!(results.players[0].total > results.players[1].total);
    assert_eq!(results.players[1].rounds.len(), 5);
}

#[test]
fn test_identical_guesses_draw() {
    let engine = engine();
    let id = engine.challenges().create(ALICE, BOB).unwrap().id;
    engine.challenges().respond(id, BOB, true).unwrap();
    engine.challenges().start(id, BOB).unwrap();

    play_all(&engine, id, BOB, 2.0);
    let last = play_all(&engine, id, ALICE, 2.0);
    assert_eq!(last[4], Some(ChallengeOutcome::Draw));

    let stored = engine.challenges().challenge(id, ALICE).unwrap();
    assert_eq!(stored.outcome, Some(ChallengeOutcome::Draw));
}

#[test]
fn test_both_players_see_the_same_locations() {
    let engine = engine();
    let challenge = engine.challenges().create(ALICE, BOB).unwrap();
    for round in 1..=ROUNDS_PER_CHALLENGE {
        let a = engine.challenges().location_for_round(challenge.id, ALICE, round).unwrap();
        let b = engine.challenges().location_for_round(challenge.id, BOB, round).unwrap();
        assert_eq!(a, b);
    }
    let ids: std::collections::BTreeSet<_> = challenge.locations.iter().map(|s| s.location.id).collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn test_declined_challenge_is_terminal() {
    let engine = engine();
    let id = engine.challenges().create(ALICE, BOB).unwrap().id;
    engine.challenges().respond(id, BOB, false).unwrap();

    let guess = Coordinate::new(0.0, 0.0).unwrap();
    assert!(matches!(
        engine.challenges().submit_round_guess(id, ALICE, 1, guess),
        Err(EngineError::InvalidState {
            status: ChallengeStatus::Declined,
            ..
        })
    ));
    assert!(engine.challenges().start(id, ALICE).is_err());
}

#[test]
fn test_strangers_cannot_challenge() {
    let engine = engine();
    assert!(matches!(
        engine.challenges().create(ALICE, CAROL),
        Err(EngineError::NotFriends { .. })
    ));
    assert!(engine.challenges().challenges_for(CAROL).unwrap().is_empty());
}

#[test]
fn test_category_too_small_for_a_challenge() {
    let engine = engine();
    // Category 3 has two locations.
    let result = engine
        .challenges()
        .create_with(ALICE, BOB, CategoryFilter::Category(3));
    assert_eq!(
        result.map(|c| c.id),
        Err(EngineError::NoLocationsRemaining {
            filter: CategoryFilter::Category(3)
        })
    );
}

#[test]
fn test_progress_tracks_each_player() {
    let engine = engine();
    let id = engine.challenges().create(ALICE, BOB).unwrap().id;
    engine.challenges().respond(id, BOB, true).unwrap();
    engine.challenges().start(id, ALICE).unwrap();

    let guess = Coordinate::new(10.0, 10.0).unwrap();
    engine.challenges().submit_round_guess(id, ALICE, 1, guess).unwrap();
    engine.challenges().submit_round_guess(id, ALICE, 2, guess).unwrap();

    let alice = engine.challenges().progress(id, ALICE).unwrap();
    let bob = engine.challenges().progress(id, BOB).unwrap();
    assert_eq!((alice.completed_rounds, alice.current_round), (2, 3));
    assert_eq!((bob.completed_rounds, bob.current_round), (0, 1));
}

#[test]
fn test_leaderboard_after_challenges() {
    let engine = engine();
    for (near, far) in [(ALICE, BOB), (ALICE, BOB), (BOB, ALICE)] {
        let id = engine.challenges().create(ALICE, BOB).unwrap().id;
        engine.challenges().respond(id, BOB, true).unwrap();
        engine.challenges().start(id, ALICE).unwrap();
        play_all(&engine, id, near, 0.1);
        play_all(&engine, id, far, 10.0);
    }

    let board = leaderboard(player_records(engine.store().as_ref(), &[ALICE, BOB]).unwrap());
    assert_eq!(board[0].user, ALICE);
    assert_eq!((board[0].wins, board[0].losses), (2, 1));
    assert_eq!((board[1].wins, board[1].losses), (1, 2));
}

#[test]
fn test_solo_session_never_repeats() {
    let engine = engine();
    let sessions = engine.sessions();
    let session = sessions.start(ALICE).unwrap();

    let mut seen = std::collections::BTreeSet::new();
    let mut closed = false;
    for _ in 0..5 {
        let location = sessions
            .next_location(session.id, ALICE, CategoryFilter::Random)
            .unwrap();
        assert!(seen.insert(location.id));
        let outcome = sessions
            .submit_guess(session.id, ALICE, location.id, location.coordinate)
            .unwrap();
        assert_eq!(outcome.event.score, 5000);
        closed = outcome.closed;
    }
    assert!(closed);

    let stored = sessions.session(session.id, ALICE).unwrap();
    assert_eq!(stored.status, SessionStatus::Closed);
    assert_eq!(stored.total_score(), 25_000);
    assert!(matches!(
        sessions.next_location(session.id, ALICE, CategoryFilter::Random),
        Err(EngineError::SessionClosed { .. })
    ));
}

#[test]
fn test_solo_session_rejects_replayed_location() {
    let engine = engine();
    let sessions = engine.sessions();
    let session = sessions.start(BOB).unwrap();
    let location = sessions
        .next_location(session.id, BOB, CategoryFilter::Random)
        .unwrap();
    sessions
        .submit_guess(session.id, BOB, location.id, location.coordinate)
        .unwrap();

    assert!(matches!(
        sessions.submit_guess(session.id, BOB, location.id, location.coordinate),
        Err(EngineError::LocationAlreadyUsed { .. })
    ));
    assert!(matches!(
        sessions.session(session.id, ALICE),
        Err(EngineError::NotAuthorized { .. })
    ));
}

#[test]
fn test_sample_catalog_supports_a_challenge() {
    let path = format!("{}/data/locations.json", env!("CARGO_MANIFEST_DIR"));
    let catalog = MemoryCatalog::load(std::path::Path::new(&path))
        .unwrap_or_else(|e| panic!("Failed to load {path}: {e}"));
    assert_eq!(catalog.len(), 12);

    let friends = Arc::new(MemoryFriendGraph::new());
    friends.befriend(ALICE, BOB).unwrap();
    let engine = Engine::in_memory(EngineConfig::default(), Arc::new(catalog), friends).unwrap();
    let challenge = engine.challenges().create(ALICE, BOB).unwrap();
    assert_eq!(challenge.locations.len(), 5);
    assert!(challenge.locations.iter().all(|s| s.location.country.is_some()));
}
