// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Geoduel: scoring and challenge engine for a location-guessing game.
//!
//! Players see a location and guess where it is on the globe. A guess is
//! scored by great-circle distance. On top of that:
//! - Solo sessions of a configurable number of rounds, never repeating a location
//! - Asynchronous head-to-head challenges over a shared 5-location sequence,
//!   completing exactly once with a winner or a draw
//! - Achievements earned by single guesses, classified into tiers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │   SessionService        ChallengeEngine     │
//! ├─────────────────────────────────────────────┤
//! │   Scorer   LocationSequencer   Achievements │
//! ├─────────────────────────────────────────────┤
//! │   Store      Catalog      FriendGraph       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use geoduel::{Coordinate, Scorer};
//!
//! let paris = Coordinate::new(48.8566, 2.3522)?;
//! let london = Coordinate::new(51.5074, -0.1278)?;
//! let score = Scorer::default().score(paris, london);
//! assert!(score.distance_km > 340.0 && score.distance_km < 345.0);
//! assert!(score.points > 4000);
//! # Ok::<(), geoduel::EngineError>(())
//! ```

pub mod achievement;
pub mod catalog;
pub mod challenge;
pub mod config;
pub mod engine;
pub mod error;
pub mod geo;
pub mod identity;
pub mod sequencer;
pub mod session;
pub mod stats;
pub mod store;

pub use error::{EngineError, EngineResult};

// Re-export key types at crate root for convenience
pub use achievement::{Achievement, AchievementReport, Tier, tier_of};
pub use catalog::{CategoryFilter, Location, LocationId, MemoryCatalog};
pub use challenge::{Challenge, ChallengeEngine, ChallengeOutcome, ChallengeStatus};
pub use config::EngineConfig;
pub use engine::Engine;
pub use geo::{Coordinate, GeoScore, Scorer};
pub use identity::{MemoryFriendGraph, UserId};
pub use session::{GameSession, SessionService};
pub use store::{MemoryStore, Store};

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix epoch milliseconds. Zero if the clock is
/// before the epoch.
#[must_use]
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_millis_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(unix_millis() > 1_577_836_800_000);
    }
}
