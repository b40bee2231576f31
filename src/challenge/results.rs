//! Derived views over round scores: progress, totals and the winner.

use serde::{Deserialize, Serialize};

use crate::challenge::{
    Challenge, ChallengeId, ChallengeOutcome, ChallengeRoundScore, ChallengeStatus,
    ROUNDS_PER_CHALLENGE,
};
use crate::identity::UserId;

/// Where a player stands in a challenge.
///
/// Derived from round-score rows on every read; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundProgress {
    /// The player.
    pub user: UserId,
    /// Rounds this player has scored.
    pub completed_rounds: u8,
    /// `1 + completed_rounds`, capped at [`ROUNDS_PER_CHALLENGE`].
    pub current_round: u8,
    /// Whether the player has scored every round.
    pub finished: bool,
}

impl RoundProgress {
    /// Progress of `user` given all round scores of a challenge.
    #[must_use]
    pub fn of(user: UserId, scores: &[ChallengeRoundScore]) -> Self {
        let rows = scores.iter().filter(|s| s.user == user).count();
        // Capped at ROUNDS_PER_CHALLENGE.
        #[allow(clippy::cast_possible_truncation)]
        let completed_rounds = rows.min(usize::from(ROUNDS_PER_CHALLENGE)) as u8;
        Self {
            user,
            completed_rounds,
            current_round: (completed_rounds + 1).min(ROUNDS_PER_CHALLENGE),
            finished: completed_rounds >= ROUNDS_PER_CHALLENGE,
        }
    }
}

/// One round in a player's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Round number, 1-based.
    pub round: u8,
    /// Points awarded.
    pub score: u32,
    /// Distance in kilometres.
    pub distance_km: f64,
}

/// A player's totals and per-round breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// The player.
    pub user: UserId,
    /// Sum of round scores so far.
    pub total: u64,
    /// Scored rounds, ordered by round number.
    pub rounds: Vec<RoundResult>,
}

impl PlayerResult {
    fn of(user: UserId, scores: &[ChallengeRoundScore]) -> Self {
        let mut rounds: Vec<RoundResult> = scores
            .iter()
            .filter(|s| s.user == user)
            .map(|s| RoundResult {
                round: s.round,
                score: s.score,
                distance_km: s.distance_km,
            })
            .collect();
        rounds.sort_by_key(|r| r.round);
        Self {
            user,
            total: rounds.iter().map(|r| u64::from(r.score)).sum(),
            rounds,
        }
    }
}

/// Results view of a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResults {
    /// The challenge.
    pub challenge: ChallengeId,
    /// Current status.
    pub status: ChallengeStatus,
    /// Outcome, once completed.
    pub outcome: Option<ChallengeOutcome>,
    /// Completion time, once completed.
    pub completed_at: Option<u64>,
    /// Challenger first, then challenged.
    pub players: Vec<PlayerResult>,
}

impl ChallengeResults {
    /// Build the view from a challenge and its round scores.
    #[must_use]
    pub fn new(challenge: &Challenge, scores: &[ChallengeRoundScore]) -> Self {
        Self {
            challenge: challenge.id,
            status: challenge.status,
            outcome: challenge.outcome,
            completed_at: challenge.completed_at,
            players: challenge
                .players()
                .iter()
                .map(|&user| PlayerResult::of(user, scores))
                .collect(),
        }
    }
}

/// Decide the outcome once both players have scored every round.
///
/// Returns `None` while either player still has rounds to play. Otherwise the
/// player with the strictly greater total wins; equal totals are a draw.
#[must_use]
pub fn decide_outcome(
    challenger: UserId,
    challenged: UserId,
    scores: &[ChallengeRoundScore],
) -> Option<ChallengeOutcome> {
    let all_rounds = |user: UserId| {
        (1..=ROUNDS_PER_CHALLENGE).all(|round| scores.iter().any(|s| s.user == user && s.round == round))
    };
    if !all_rounds(challenger) || !all_rounds(challenged) {
        return None;
    }

    let total = |user: UserId| -> u64 {
        scores
            .iter()
            .filter(|s| s.user == user)
            .map(|s| u64::from(s.score))
            .sum()
    };
    let (a, b) = (total(challenger), total(challenged));
    Some(match a.cmp(&b) {
        std::cmp::Ordering::Greater => ChallengeOutcome::Winner(challenger),
        std::cmp::Ordering::Less => ChallengeOutcome::Winner(challenged),
        std::cmp::Ordering::Equal => ChallengeOutcome::Draw,
    })
}
