//! Geodesic distance and the distance-to-points transform.
//!
//! Scoring is a pure function of two coordinates:
//! - Distance is the haversine great-circle distance on a sphere of radius
//!   [`EARTH_RADIUS_KM`].
//! - Points decay exponentially with distance, from `max_points` at 0 km down
//!   to 0 at the saturation radius, and are clamped to `[0, max_points]`.

use serde::{Deserialize, Serialize};

use crate::config::ScoringConfig;
use crate::error::{EngineError, EngineResult};

/// Mean Earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the globe in degrees.
///
/// Always within `[-90, 90]` latitude and `[-180, 180]` longitude; the only
/// way to build one is through [`Coordinate::new`] (or deserialization, which
/// goes through the same check).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate", into = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

/// Unchecked wire form of a [`Coordinate`].
#[derive(Clone, Copy, Serialize, Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate, rejecting out-of-range or non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCoordinate`] if latitude is outside
    /// `[-90, 90]` or longitude is outside `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> EngineResult<Self> {
        if (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude) {
            Ok(Self {
                latitude,
                longitude,
            })
        } else {
            Err(EngineError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Great-circle distance to another coordinate in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(*self, *other)
    }
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = EngineError;

    fn try_from(raw: RawCoordinate) -> EngineResult<Self> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<Coordinate> for RawCoordinate {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.latitude, self.longitude)
    }
}

/// Haversine distance between two coordinates in kilometres.
///
/// Symmetric, and exactly zero for identical inputs.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] near antipodes.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Outcome of scoring one guess.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoScore {
    /// Great-circle distance between guess and answer, in kilometres.
    pub distance_km: f64,
    /// Points awarded.
    pub points: u32,
}

/// Stateless scorer parameterized by a [`ScoringConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Scorer {
    curve: ScoringConfig,
}

impl Scorer {
    /// Create a scorer with the given curve.
    #[must_use]
    pub const fn new(curve: ScoringConfig) -> Self {
        Self { curve }
    }

    /// The curve this scorer applies.
    #[must_use]
    pub const fn curve(&self) -> &ScoringConfig {
        &self.curve
    }

    /// Maximum points for a single guess.
    #[must_use]
    pub const fn max_points(&self) -> u32 {
        self.curve.max_points
    }

    /// Points for a given distance.
    ///
    /// Non-increasing in distance; `max_points` at 0 km and 0 at or beyond the
    /// saturation radius.
    #[must_use]
    pub fn points_for_distance(&self, distance_km: f64) -> u32 {
        if distance_km.is_nan() || distance_km >= self.curve.saturation_km {
            return 0;
        }
        let max = f64::from(self.curve.max_points);
        let raw = max * (-distance_km.max(0.0) / self.curve.decay_km).exp();

        // Clamped to [0, max_points] which fits in u32.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let points = raw.round().clamp(0.0, max) as u32;
        points
    }

    /// Score a guess against the actual location.
    #[must_use]
    pub fn score(&self, guessed: Coordinate, actual: Coordinate) -> GeoScore {
        let distance_km = haversine_km(guessed, actual);
        GeoScore {
            distance_km,
            points: self.points_for_distance(distance_km),
        }
    }

    /// Score raw `(latitude, longitude)` pairs, validating both.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCoordinate`] for the first pair out of range.
    pub fn score_degrees(&self, guessed: (f64, f64), actual: (f64, f64)) -> EngineResult<GeoScore> {
        let guessed = Coordinate::new(guessed.0, guessed.1)?;
        let actual = Coordinate::new(actual.0, actual.1)?;
        Ok(self.score(guessed, actual))
    }
}

/// Score a guess with the default curve.
#[must_use]
pub fn score(guessed: Coordinate, actual: Coordinate) -> GeoScore {
    Scorer::default().score(guessed, actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_paris_exact_guess() {
        let paris = coord(48.8566, 2.3522);
        let result = score(paris, paris);
        assert!(result.distance_km.abs() < f64::EPSILON);
        assert_eq!(result.points, 5000);
    }

    #[test]
    fn test_antipodal_guess_scores_zero() {
        let result = score(coord(0.0, 0.0), coord(0.0, 180.0));
        assert!((result.distance_km - 20_015.0).abs() < 1.0);
        assert_eq!(result.points, 0);
    }

    #[test]
    fn test_known_city_distance() {
        // London to New York is roughly 5570 km.
        let london = coord(51.5074, -0.1278);
        let new_york = coord(40.7128, -74.0060);
        let d = london.distance_km(&new_york);
        assert!((d - 5570.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn test_curve_reference_points() {
        let scorer = Scorer::default();
        assert_eq!(scorer.points_for_distance(0.0), 5000);
        assert_eq!(scorer.points_for_distance(2000.0), 1839);
        assert_eq!(scorer.points_for_distance(10_000.0), 34);
        assert_eq!(scorer.points_for_distance(19_999.0), 0);
        assert_eq!(scorer.points_for_distance(20_000.0), 0);
        assert_eq!(scorer.points_for_distance(f64::INFINITY), 0);
        assert_eq!(scorer.points_for_distance(f64::NAN), 0);
    }

    #[test]
    fn test_curve_is_non_increasing() {
        let scorer = Scorer::default();
        let mut previous = scorer.points_for_distance(0.0);
        for step in 1..=2100 {
            let points = scorer.points_for_distance(f64::from(step) * 10.0);
            assert!(points <= previous, "score rose at {} km", step * 10);
            previous = points;
        }
    }

    #[test]
    fn test_custom_curve() {
        let scorer = Scorer::new(ScoringConfig {
            max_points: 1000,
            decay_km: 500.0,
            saturation_km: 1000.0,
        });
        assert_eq!(scorer.max_points(), 1000);
        assert_eq!(scorer.points_for_distance(0.0), 1000);
        assert_eq!(scorer.points_for_distance(500.0), 368);
        assert_eq!(scorer.points_for_distance(1000.0), 0);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(
            Coordinate::new(90.5, 0.0),
            Err(EngineError::InvalidCoordinate { .. })
        ));
        assert!(Coordinate::new(0.0, -180.1).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
        assert!(Scorer::default().score_degrees((0.0, 0.0), (100.0, 0.0)).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Coordinate = serde_json::from_str(r#"{"latitude": 10.0, "longitude": 20.0}"#).unwrap();
        assert!((ok.latitude() - 10.0).abs() < f64::EPSILON);
        assert!((ok.longitude() - 20.0).abs() < f64::EPSILON);

        let bad = serde_json::from_str::<Coordinate>(r#"{"latitude": 95.0, "longitude": 0.0}"#);
        assert!(bad.is_err());
    }
}
