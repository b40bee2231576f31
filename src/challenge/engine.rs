//! The challenge state machine.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::achievement::{AchievementEvaluator, AchievementReport, ScoredGuess};
use crate::catalog::{CategoryFilter, Location};
use crate::challenge::{
    Challenge, ChallengeId, ChallengeOutcome, ChallengeResults, ChallengeRoundScore,
    ChallengeStatus, RoundProgress, decide_outcome,
};
use crate::error::{EngineError, EngineResult};
use crate::geo::{Coordinate, Scorer};
use crate::identity::{FriendGraph, UserId};
use crate::sequencer::LocationSequencer;
use crate::store::Store;
use crate::unix_millis;

/// Result of a successful round submission.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundSubmission {
    /// The stored round score.
    pub score: ChallengeRoundScore,
    /// The submitting player's progress after this round.
    pub progress: RoundProgress,
    /// Set when this submission completed the challenge.
    pub completion: Option<ChallengeCompletion>,
}

/// Emitted exactly once per challenge, by the submission that completed it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeCompletion {
    /// Winner or draw.
    pub outcome: ChallengeOutcome,
    /// Completion time, Unix epoch milliseconds.
    pub completed_at: u64,
    /// Achievement changes for each player that could be evaluated.
    pub achievements: Vec<AchievementReport>,
}

/// Owns challenge lifecycle and round scoring.
#[derive(Debug)]
pub struct ChallengeEngine {
    store: Arc<dyn Store>,
    friends: Arc<dyn FriendGraph>,
    sequencer: Arc<LocationSequencer>,
    achievements: Arc<AchievementEvaluator>,
    scorer: Scorer,
    /// One serialization point per live challenge.
    guards: Mutex<HashMap<ChallengeId, Arc<Mutex<()>>>>,
}

impl ChallengeEngine {
    /// Create an engine.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        friends: Arc<dyn FriendGraph>,
        sequencer: Arc<LocationSequencer>,
        achievements: Arc<AchievementEvaluator>,
        scorer: Scorer,
    ) -> Self {
        Self {
            store,
            friends,
            sequencer,
            achievements,
            scorer,
            guards: Mutex::new(HashMap::new()),
        }
    }

    /// Challenge a friend over a random 5-location sequence.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SelfChallenge`] if both ids are equal.
    /// - [`EngineError::NotFriends`] if the users are not connected.
    /// - [`EngineError::NoLocationsRemaining`] if the catalog is too small.
    pub fn create(&self, challenger: UserId, challenged: UserId) -> EngineResult<Challenge> {
        self.create_with(challenger, challenged, CategoryFilter::Random)
    }

    /// Like [`ChallengeEngine::create`], drawing locations from `filter`.
    ///
    /// # Errors
    ///
    /// See [`ChallengeEngine::create`].
    pub fn create_with(
        &self,
        challenger: UserId,
        challenged: UserId,
        filter: CategoryFilter,
    ) -> EngineResult<Challenge> {
        if challenger == challenged {
            return Err(EngineError::SelfChallenge { user: challenger });
        }
        let friends = self
            .friends
            .are_friends(challenger, challenged)
            .inspect_err(EngineError::warn_if_unavailable)?;
        if !friends {
            return Err(EngineError::NotFriends {
                challenger,
                challenged,
            });
        }

        let locations = self
            .sequencer
            .challenge_sequence(filter)
            .inspect_err(EngineError::warn_if_unavailable)?;
        let id = self.store.next_id()?;
        let challenge = Challenge::new(id, challenger, challenged, locations, unix_millis());
        self.store.insert_challenge(&challenge)?;

        info!("challenge {id} created: {challenger} vs {challenged}");
        Ok(challenge)
    }

    /// Accept or decline a pending challenge. Only the challenged user may respond.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthorized`] if `caller` is not the challenged user.
    /// - [`EngineError::InvalidState`] if the challenge is not pending.
    pub fn respond(&self, id: ChallengeId, caller: UserId, accept: bool) -> EngineResult<Challenge> {
        let guard = self.guard(id)?;
        let _held = guard.lock().map_err(|e| EngineError::unavailable("challenge guard", e))?;

        let challenge = self.reload(id)?;
        if caller != challenge.challenged {
            return Err(EngineError::NotAuthorized {
                user: caller,
                action: "respond to this challenge",
            });
        }
        if challenge.status != ChallengeStatus::Pending {
            return Err(EngineError::InvalidState {
                challenge: id,
                status: challenge.status,
                action: "respond to",
            });
        }

        let next = if accept {
            ChallengeStatus::Accepted
        } else {
            ChallengeStatus::Declined
        };
        let updated = self.store.transition_challenge(id, ChallengeStatus::Pending, next)?;
        info!("challenge {id} {next} by user {caller}");

        if next.is_terminal() {
            self.release(id);
        }
        Ok(updated)
    }

    /// Move an accepted challenge into play. Idempotent once in progress.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthorized`] if `caller` is not a participant.
    /// - [`EngineError::InvalidState`] if the challenge is neither accepted nor in progress.
    pub fn start(&self, id: ChallengeId, caller: UserId) -> EngineResult<Challenge> {
        let guard = self.guard(id)?;
        let _held = guard.lock().map_err(|e| EngineError::unavailable("challenge guard", e))?;

        let challenge = require_participant(self.reload(id)?, caller, "start this challenge")?;
        match challenge.status {
            ChallengeStatus::InProgress => Ok(challenge),
            ChallengeStatus::Accepted => {
                let updated = self.store.transition_challenge(
                    id,
                    ChallengeStatus::Accepted,
                    ChallengeStatus::InProgress,
                )?;
                info!("challenge {id} started");
                Ok(updated)
            }
            status => Err(EngineError::InvalidState {
                challenge: id,
                status,
                action: "start",
            }),
        }
    }

    /// Score `caller`'s guess for `round` and complete the challenge if this
    /// was the last missing round.
    ///
    /// # Errors
    ///
    /// - [`EngineError::NotAuthorized`] if `caller` is not a participant.
    /// - [`EngineError::InvalidState`] unless the challenge is in progress.
    /// - [`EngineError::RoundAlreadyScored`] if the round is already scored for
    ///   `caller`. Callers should treat this as success.
    /// - [`EngineError::InvalidRound`] if `round` is out of range or ahead of
    ///   `caller`'s next playable round.
    pub fn submit_round_guess(
        &self,
        id: ChallengeId,
        caller: UserId,
        round: u8,
        guessed: Coordinate,
    ) -> EngineResult<RoundSubmission> {
        let guard = self.guard(id)?;
        let _held = guard.lock().map_err(|e| EngineError::unavailable("challenge guard", e))?;

        let challenge = require_participant(self.reload(id)?, caller, "play this challenge")?;
        if challenge.status != ChallengeStatus::InProgress {
            return Err(EngineError::InvalidState {
                challenge: id,
                status: challenge.status,
                action: "submit a guess to",
            });
        }

        let existing = self.store.round_scores(id)?;
        if existing.iter().any(|s| s.user == caller && s.round == round) {
            debug!("challenge {id}: round {round} already scored for user {caller}");
            return Err(EngineError::RoundAlreadyScored {
                challenge: id,
                user: caller,
                round,
            });
        }
        let progress = RoundProgress::of(caller, &existing);
        if progress.finished || round != progress.current_round {
            return Err(EngineError::InvalidRound {
                round,
                next: progress.current_round,
            });
        }

        let location = challenge
            .location_for_round(round)
            .ok_or(EngineError::NotFound {
                entity: "challenge round",
                id: u64::from(round),
            })?;
        let result = self.scorer.score(guessed, location.coordinate);
        let score = ChallengeRoundScore {
            challenge: id,
            user: caller,
            round,
            score: result.points,
            distance_km: result.distance_km,
            guessed,
            submitted_at: unix_millis(),
        };
        if let Err(e) = self.store.insert_round_score(&score) {
            if e.is_idempotent_success() {
                debug!("challenge {id}: duplicate round {round} from user {caller} rejected by store");
            }
            return Err(e);
        }
        debug!(
            "challenge {id} round {round} user {caller}: {:.1} km, {} points",
            score.distance_km, score.score
        );

        let scores = self.store.round_scores(id)?;
        let progress = RoundProgress::of(caller, &scores);
        let completion = self.try_complete(&challenge, &scores)?;

        Ok(RoundSubmission {
            score,
            progress,
            completion,
        })
    }

    /// Derived progress of `viewer` in challenge `id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotAuthorized`] for non-participants.
    pub fn progress(&self, id: ChallengeId, viewer: UserId) -> EngineResult<RoundProgress> {
        self.participant_view(id, viewer, "view this challenge")?;
        let scores = self.store.round_scores(id)?;
        Ok(RoundProgress::of(viewer, &scores))
    }

    /// The location for `round`, the same for both players.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotAuthorized`] for non-participants and
    /// [`EngineError::InvalidRound`] for rounds outside `1..=5`.
    pub fn location_for_round(
        &self,
        id: ChallengeId,
        viewer: UserId,
        round: u8,
    ) -> EngineResult<Location> {
        let challenge = self.participant_view(id, viewer, "view this challenge")?;
        if let Some(location) = challenge.location_for_round(round) {
            return Ok(location.clone());
        }
        let scores = self.store.round_scores(id)?;
        Err(EngineError::InvalidRound {
            round,
            next: RoundProgress::of(viewer, &scores).current_round,
        })
    }

    /// Totals and per-round breakdown for both players.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotAuthorized`] for non-participants.
    pub fn results(&self, id: ChallengeId, viewer: UserId) -> EngineResult<ChallengeResults> {
        let challenge = self.participant_view(id, viewer, "view this challenge")?;
        let scores = self.store.round_scores(id)?;
        Ok(ChallengeResults::new(&challenge, &scores))
    }

    /// A challenge as seen by one of its participants.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotAuthorized`] for non-participants.
    pub fn challenge(&self, id: ChallengeId, viewer: UserId) -> EngineResult<Challenge> {
        self.participant_view(id, viewer, "view this challenge")
    }

    /// All challenges `user` takes part in.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn challenges_for(&self, user: UserId) -> EngineResult<Vec<Challenge>> {
        self.store.challenges_for(user)
    }

    /// Complete the challenge if every round of both players is scored.
    ///
    /// Must run under the challenge guard. The store's compare-and-set makes
    /// the transition happen at most once even across engine instances.
    fn try_complete(
        &self,
        challenge: &Challenge,
        scores: &[ChallengeRoundScore],
    ) -> EngineResult<Option<ChallengeCompletion>> {
        let Some(outcome) = decide_outcome(challenge.challenger, challenge.challenged, scores)
        else {
            return Ok(None);
        };

        let completed_at = unix_millis();
        let completed = match self.store.complete_challenge(challenge.id, outcome, completed_at) {
            Ok(completed) => completed,
            Err(EngineError::InvalidState {
                status: ChallengeStatus::Completed,
                ..
            }) => {
                debug!("challenge {} was completed by another writer", challenge.id);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        self.release(challenge.id);

        match outcome {
            ChallengeOutcome::Winner(user) => {
                info!("challenge {} completed, winner user {user}", challenge.id);
            }
            ChallengeOutcome::Draw => info!("challenge {} completed in a draw", challenge.id),
        }

        let achievements = challenge
            .players()
            .into_iter()
            .filter_map(|user| self.evaluate_achievements(&completed, user, scores))
            .collect();

        Ok(Some(ChallengeCompletion {
            outcome,
            completed_at: completed.completed_at.unwrap_or(completed_at),
            achievements,
        }))
    }

    /// A failure here is logged; completion stands.
    fn evaluate_achievements(
        &self,
        challenge: &Challenge,
        user: UserId,
        scores: &[ChallengeRoundScore],
    ) -> Option<AchievementReport> {
        let guesses: Vec<ScoredGuess<'_>> = scores
            .iter()
            .filter(|s| s.user == user)
            .filter_map(|s| {
                challenge.location_for_round(s.round).map(|location| ScoredGuess {
                    location,
                    points: s.score,
                })
            })
            .collect();

        match self.achievements.evaluate(user, &guesses) {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(
                    "achievement evaluation failed for user {user} in challenge {}: {e}",
                    challenge.id
                );
                None
            }
        }
    }

    fn participant_view(
        &self,
        id: ChallengeId,
        caller: UserId,
        action: &'static str,
    ) -> EngineResult<Challenge> {
        require_participant(self.store.challenge(id)?, caller, action)
    }

    /// Serialization point for `id`.
    ///
    /// Unknown and terminal challenges get a private guard that is never
    /// stored, so the map only holds live challenges.
    fn guard(&self, id: ChallengeId) -> EngineResult<Arc<Mutex<()>>> {
        let status = self.store.challenge(id)?.status;
        let mut guards = self
            .guards
            .lock()
            .map_err(|e| EngineError::unavailable("challenge guard", e))?;
        if status.is_terminal() {
            guards.remove(&id);
            return Ok(Arc::default());
        }
        Ok(Arc::clone(guards.entry(id).or_default()))
    }

    /// Load `id` under its guard, dropping the guard if the challenge turned
    /// terminal since [`ChallengeEngine::guard`] looked.
    fn reload(&self, id: ChallengeId) -> EngineResult<Challenge> {
        let challenge = self.store.challenge(id)?;
        if challenge.status.is_terminal() {
            self.release(id);
        }
        Ok(challenge)
    }

    /// Drop the guard of a challenge that reached a terminal status.
    ///
    /// A caller still holding the old guard only sees the terminal status and
    /// fails with `InvalidState`, so a fresh guard cannot race it.
    fn release(&self, id: ChallengeId) {
        if let Ok(mut guards) = self.guards.lock() {
            guards.remove(&id);
        }
    }
}

fn require_participant(
    challenge: Challenge,
    caller: UserId,
    action: &'static str,
) -> EngineResult<Challenge> {
    if !challenge.is_participant(caller) {
        return Err(EngineError::NotAuthorized {
            user: caller,
            action,
        });
    }
    Ok(challenge)
}
