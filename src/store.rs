//! Persistence seam for sessions, challenges, round scores and earned
//! achievements.
//!
//! The [`Store`] trait carries the write-time guarantees the engines rely on:
//! `(challenge, user, round)` uniqueness for round scores and compare-and-set
//! status transitions for challenges. [`MemoryStore`] is the in-process
//! implementation, with JSON snapshots for the CLI.

mod memory;

pub use memory::MemoryStore;

use std::collections::BTreeSet;
use std::fmt;

use crate::achievement::AchievementId;
use crate::challenge::{Challenge, ChallengeId, ChallengeOutcome, ChallengeRoundScore, ChallengeStatus};
use crate::error::EngineResult;
use crate::identity::UserId;
use crate::session::{GameSession, SessionId};

/// Storage backend shared by the session, challenge and achievement services.
pub trait Store: Send + Sync + fmt::Debug {
    /// Allocate a fresh identifier, unique across all entities of this store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn next_id(&self) -> EngineResult<u64>;

    /// Insert a new session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn insert_session(&self, session: &GameSession) -> EngineResult<()>;

    /// Load a session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::NotFound`] for unknown ids.
    fn session(&self, id: SessionId) -> EngineResult<GameSession>;

    /// Replace a stored session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::NotFound`] for unknown ids.
    fn update_session(&self, session: &GameSession) -> EngineResult<()>;

    /// Sessions owned by `user`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn sessions_for(&self, user: UserId) -> EngineResult<Vec<GameSession>>;

    /// Insert a new challenge.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn insert_challenge(&self, challenge: &Challenge) -> EngineResult<()>;

    /// Load a challenge.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::NotFound`] for unknown ids.
    fn challenge(&self, id: ChallengeId) -> EngineResult<Challenge>;

    /// Challenges `user` takes part in, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn challenges_for(&self, user: UserId) -> EngineResult<Vec<Challenge>>;

    /// Move a challenge from `from` to `to` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::InvalidState`] if the stored status is not
    /// `from` or the transition is illegal.
    fn transition_challenge(
        &self,
        id: ChallengeId,
        from: ChallengeStatus,
        to: ChallengeStatus,
    ) -> EngineResult<Challenge>;

    /// Move an in-progress challenge to completed, recording the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::InvalidState`] if the challenge is not in
    /// progress. A second completion therefore fails with status `completed`.
    fn complete_challenge(
        &self,
        id: ChallengeId,
        outcome: ChallengeOutcome,
        completed_at: u64,
    ) -> EngineResult<Challenge>;

    /// Insert a round score.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::RoundAlreadyScored`] if a row for the same
    /// `(challenge, user, round)` exists.
    fn insert_round_score(&self, score: &ChallengeRoundScore) -> EngineResult<()>;

    /// All round scores of a challenge, ordered by `(user, round)`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn round_scores(&self, challenge: ChallengeId) -> EngineResult<Vec<ChallengeRoundScore>>;

    /// Achievement ids `user` already holds.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn earned_achievements(&self, user: UserId) -> EngineResult<BTreeSet<AchievementId>>;

    /// Add achievement ids to `user`'s earned set. Existing ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the store is unreachable.
    fn record_achievements(&self, user: UserId, ids: &[AchievementId]) -> EngineResult<()>;
}
