//! Asynchronous head-to-head challenges.
//!
//! Two players independently play the same fixed sequence of
//! [`ROUNDS_PER_CHALLENGE`] locations. The challenge moves through
//! `pending → accepted → in_progress → completed` (or `pending → declined`)
//! and completes exactly once, when both players have scored every round.
//!
//! # Concurrency
//!
//! Players submit on independent, unsynchronized callers. [`ChallengeEngine`]
//! serializes all mutations of one challenge behind a per-challenge guard,
//! and the [`crate::store::Store`] enforces the `(challenge, user, round)`
//! uniqueness and the `in_progress → completed` compare-and-set at the point
//! of write.

mod engine;
mod results;
mod status;

pub use engine::{ChallengeCompletion, ChallengeEngine, RoundSubmission};
pub use results::{ChallengeResults, PlayerResult, RoundProgress, RoundResult, decide_outcome};
pub use status::ChallengeStatus;

use serde::{Deserialize, Serialize};

use crate::catalog::Location;
use crate::geo::Coordinate;
use crate::identity::UserId;
use crate::sequencer::SequencedLocation;

/// Unique identifier for a challenge.
pub type ChallengeId = u64;

/// Number of rounds (and locations) in every challenge.
pub const ROUNDS_PER_CHALLENGE: u8 = 5;

/// How a completed challenge ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeOutcome {
    /// One player had the strictly higher total.
    Winner(UserId),
    /// Both totals were equal.
    Draw,
}

/// A challenge between two users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Unique identifier.
    pub id: ChallengeId,
    /// User who issued the challenge.
    pub challenger: UserId,
    /// User who was challenged.
    pub challenged: UserId,
    /// The shared location sequence, ordered by `order_index`. Never changes.
    pub locations: Vec<SequencedLocation>,
    /// Current status.
    pub status: ChallengeStatus,
    /// Creation time, Unix epoch milliseconds.
    pub created_at: u64,
    /// Completion time, Unix epoch milliseconds.
    pub completed_at: Option<u64>,
    /// Result, set on completion.
    pub outcome: Option<ChallengeOutcome>,
}

impl Challenge {
    /// Create a pending challenge.
    #[must_use]
    pub fn new(
        id: ChallengeId,
        challenger: UserId,
        challenged: UserId,
        locations: Vec<SequencedLocation>,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            challenger,
            challenged,
            locations,
            status: ChallengeStatus::Pending,
            created_at,
            completed_at: None,
            outcome: None,
        }
    }

    /// Whether `user` is one of the two players.
    #[must_use]
    pub const fn is_participant(&self, user: UserId) -> bool {
        user == self.challenger || user == self.challenged
    }

    /// Both players, challenger first.
    #[must_use]
    pub const fn players(&self) -> [UserId; 2] {
        [self.challenger, self.challenged]
    }

    /// The other player, if `user` participates.
    #[must_use]
    pub const fn opponent_of(&self, user: UserId) -> Option<UserId> {
        if user == self.challenger {
            Some(self.challenged)
        } else if user == self.challenged {
            Some(self.challenger)
        } else {
            None
        }
    }

    /// The location played in `round` (1-based), identical for both players.
    #[must_use]
    pub fn location_for_round(&self, round: u8) -> Option<&Location> {
        self.locations
            .iter()
            .find(|s| s.order_index == round)
            .map(|s| &s.location)
    }
}

/// One player's score for one round. At most one per `(challenge, user, round)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeRoundScore {
    /// The challenge.
    pub challenge: ChallengeId,
    /// The player.
    pub user: UserId,
    /// Round number, 1-based.
    pub round: u8,
    /// Points awarded.
    pub score: u32,
    /// Great-circle distance in kilometres.
    pub distance_km: f64,
    /// Where the player guessed.
    pub guessed: Coordinate,
    /// Submission time, Unix epoch milliseconds.
    pub submitted_at: u64,
}
