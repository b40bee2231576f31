#![no_main]

use arbitrary::Arbitrary;
use geoduel::geo::{EARTH_RADIUS_KM, haversine_km};
use geoduel::{Coordinate, Scorer};
use libfuzzer_sys::fuzz_target;

/// Raw degrees, possibly out of range or non-finite.
#[derive(Arbitrary, Debug)]
struct ScoringInput {
    guess_lat: f64,
    guess_lon: f64,
    actual_lat: f64,
    actual_lon: f64,
}

fuzz_target!(|input: ScoringInput| {
    let scorer = Scorer::default();
    let result = scorer.score_degrees(
        (input.guess_lat, input.guess_lon),
        (input.actual_lat, input.actual_lon),
    );

    let (Ok(guess), Ok(actual)) = (
        Coordinate::new(input.guess_lat, input.guess_lon),
        Coordinate::new(input.actual_lat, input.actual_lon),
    ) else {
        assert!(result.is_err(), "out-of-range input was scored");
        return;
    };

    let score = result.expect("valid coordinates score");
    assert!(score.points <= scorer.max_points());
    assert!(score.distance_km >= 0.0);
    assert!(score.distance_km <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
    assert_eq!(score.points, scorer.score(actual, guess).points);
    assert!((haversine_km(guess, actual) - score.distance_km).abs() < 1e-9);
});
