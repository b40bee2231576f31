//! Error types for the scoring and challenge engine.

use log::warn;
use thiserror::Error;

use crate::catalog::{CategoryFilter, LocationId};
use crate::challenge::{ChallengeId, ChallengeStatus};
use crate::identity::UserId;
use crate::session::SessionId;

/// Errors surfaced by engine operations.
///
/// Every variant is a recoverable, typed result. None of them is retried
/// internally; retry policy belongs to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Latitude or longitude outside the valid range (or not a number).
    #[error("invalid coordinate ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Offending latitude in degrees.
        latitude: f64,
        /// Offending longitude in degrees.
        longitude: f64,
    },

    /// The catalog has no unused location left for the requested filter.
    #[error("no more locations in {filter}")]
    NoLocationsRemaining {
        /// The filter that produced an empty candidate set.
        filter: CategoryFilter,
    },

    /// A guess was submitted to a session that is already closed.
    #[error("session {session} is closed")]
    SessionClosed {
        /// The closed session.
        session: SessionId,
    },

    /// A location was guessed twice within one session.
    #[error("location {location} was already played in session {session}")]
    LocationAlreadyUsed {
        /// The session.
        session: SessionId,
        /// The repeated location.
        location: LocationId,
    },

    /// A user tried to challenge themselves.
    #[error("user {user} cannot challenge themselves")]
    SelfChallenge {
        /// The user.
        user: UserId,
    },

    /// The two users are not connected in the friend graph.
    #[error("users {challenger} and {challenged} are not friends")]
    NotFriends {
        /// The user issuing the challenge.
        challenger: UserId,
        /// The user being challenged.
        challenged: UserId,
    },

    /// The caller is not allowed to perform the action.
    #[error("user {user} is not allowed to {action}")]
    NotAuthorized {
        /// The caller.
        user: UserId,
        /// Short description of the attempted action.
        action: &'static str,
    },

    /// The challenge is not in a status that allows the action.
    #[error("cannot {action} challenge {challenge} while it is {status}")]
    InvalidState {
        /// The challenge.
        challenge: ChallengeId,
        /// Its current status.
        status: ChallengeStatus,
        /// Short description of the attempted action.
        action: &'static str,
    },

    /// The round number is out of range or ahead of the player's progress.
    #[error("round {round} cannot be played now (next playable round is {next})")]
    InvalidRound {
        /// The requested round.
        round: u8,
        /// The caller's next playable round.
        next: u8,
    },

    /// A score already exists for this (challenge, user, round).
    ///
    /// This is the expected outcome of a duplicate or concurrent submission:
    /// the round is scored, just by an earlier call.
    #[error("round {round} of challenge {challenge} is already scored for user {user}")]
    RoundAlreadyScored {
        /// The challenge.
        challenge: ChallengeId,
        /// The submitting user.
        user: UserId,
        /// The round number (1-based).
        round: u8,
    },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record ("challenge", "session", "location", ...).
        entity: &'static str,
        /// The missing identifier.
        id: u64,
    },

    /// An external collaborator (storage, catalog, friend graph) failed.
    #[error("{dependency} unavailable: {reason}")]
    DependencyUnavailable {
        /// Which collaborator failed.
        dependency: &'static str,
        /// Failure details.
        reason: String,
    },
}

impl EngineError {
    /// Whether the submitting player should treat this error as success.
    ///
    /// Only [`EngineError::RoundAlreadyScored`] qualifies.
    #[must_use]
    pub const fn is_idempotent_success(&self) -> bool {
        matches!(self, Self::RoundAlreadyScored { .. })
    }

    /// Build a [`EngineError::DependencyUnavailable`] from any displayable cause.
    pub fn unavailable(dependency: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::DependencyUnavailable {
            dependency,
            reason: reason.to_string(),
        }
    }

    /// Log a collaborator failure at `warn`. Other kinds are left to the caller.
    pub(crate) fn warn_if_unavailable(&self) {
        if let Self::DependencyUnavailable { dependency, reason } = self {
            warn!("{dependency} unavailable: {reason}");
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
