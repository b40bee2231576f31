//! Solo game sessions.
//!
//! A session is a fixed number of rounds owned by a single user. Each round
//! scores one guess and appends an immutable [`GuessEvent`]; the session closes
//! itself when the round target is reached, or earlier on an explicit `end`.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::achievement::{AchievementEvaluator, AchievementReport, ScoredGuess};
use crate::catalog::{Catalog, CategoryFilter, Location, LocationId};
use crate::error::{EngineError, EngineResult};
use crate::geo::{Coordinate, Scorer};
use crate::identity::UserId;
use crate::sequencer::LocationSequencer;
use crate::store::Store;
use crate::unix_millis;

/// Unique identifier for a session.
pub type SessionId = u64;

/// Default number of rounds in a session.
pub const DEFAULT_SESSION_ROUNDS: u8 = 5;

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting guesses.
    Open,
    /// Finished; no more guesses.
    Closed,
}

/// One scored guess. Immutable once created.
///
/// Carries the actual coordinate it was scored against, so the score can be
/// reproduced even if the catalog entry later changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuessEvent {
    /// Owning session.
    pub session: SessionId,
    /// Round number, 1-based.
    pub round: u8,
    /// Location that was played.
    pub location: LocationId,
    /// Where the player guessed.
    pub guessed: Coordinate,
    /// Where the location was at submission time.
    pub actual: Coordinate,
    /// Great-circle distance in kilometres.
    pub distance_km: f64,
    /// Points awarded.
    pub score: u32,
    /// Submission time, Unix epoch milliseconds.
    pub submitted_at: u64,
}

/// A solo run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSession {
    /// Unique identifier.
    pub id: SessionId,
    /// The playing user.
    pub owner: UserId,
    /// Rounds after which the session closes.
    pub round_target: u8,
    /// Current status.
    pub status: SessionStatus,
    /// Scored guesses in round order.
    pub events: Vec<GuessEvent>,
    /// Locations already played in this session.
    pub used_locations: BTreeSet<LocationId>,
    /// Start time, Unix epoch milliseconds.
    pub started_at: u64,
    /// Close time, Unix epoch milliseconds.
    pub ended_at: Option<u64>,
}

impl GameSession {
    /// Open a new session at round 0.
    #[must_use]
    pub fn new(id: SessionId, owner: UserId, round_target: u8, now: u64) -> Self {
        Self {
            id,
            owner,
            round_target,
            status: SessionStatus::Open,
            events: Vec::new(),
            used_locations: BTreeSet::new(),
            started_at: now,
            ended_at: None,
        }
    }

    /// Number of rounds played so far.
    #[must_use]
    pub fn round_index(&self) -> u8 {
        // Bounded by round_target (a u8).
        #[allow(clippy::cast_possible_truncation)]
        let rounds = self.events.len() as u8;
        rounds
    }

    /// Whether the session still accepts guesses.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == SessionStatus::Open
    }

    /// Sum of all round scores.
    #[must_use]
    pub fn total_score(&self) -> u64 {
        self.events.iter().map(|e| u64::from(e.score)).sum()
    }

    /// Score a guess for `location` and append it as the next round.
    ///
    /// Closes the session when this was the last round.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SessionClosed`] if the session is closed.
    /// - [`EngineError::LocationAlreadyUsed`] if `location` was already played.
    pub fn record_guess(
        &mut self,
        scorer: &Scorer,
        location: &Location,
        guessed: Coordinate,
        now: u64,
    ) -> EngineResult<GuessEvent> {
        if !self.is_open() || self.round_index() >= self.round_target {
            return Err(EngineError::SessionClosed { session: self.id });
        }
        if self.used_locations.contains(&location.id) {
            return Err(EngineError::LocationAlreadyUsed {
                session: self.id,
                location: location.id,
            });
        }

        let result = scorer.score(guessed, location.coordinate);
        let event = GuessEvent {
            session: self.id,
            round: self.round_index() + 1,
            location: location.id,
            guessed,
            actual: location.coordinate,
            distance_km: result.distance_km,
            score: result.points,
            submitted_at: now,
        };
        self.events.push(event.clone());
        self.used_locations.insert(location.id);

        if self.round_index() >= self.round_target {
            self.end(now);
        }
        Ok(event)
    }

    /// Close the session. Returns `false` if it was already closed.
    pub fn end(&mut self, now: u64) -> bool {
        if !self.is_open() {
            return false;
        }
        self.status = SessionStatus::Closed;
        self.ended_at = Some(now);
        true
    }
}

/// Result of submitting a solo guess.
#[derive(Debug, Clone, PartialEq)]
pub struct GuessOutcome {
    /// The recorded event.
    pub event: GuessEvent,
    /// Session total after this round.
    pub total_score: u64,
    /// Whether this guess closed the session.
    pub closed: bool,
    /// Achievements evaluated on close.
    pub achievements: Option<AchievementReport>,
}

/// Drives solo sessions against the store, catalog and scorer.
#[derive(Debug)]
pub struct SessionService {
    store: Arc<dyn Store>,
    sequencer: Arc<LocationSequencer>,
    achievements: Arc<AchievementEvaluator>,
    scorer: Scorer,
    round_target: u8,
}

impl SessionService {
    /// Create a service.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        sequencer: Arc<LocationSequencer>,
        achievements: Arc<AchievementEvaluator>,
        scorer: Scorer,
        round_target: u8,
    ) -> Self {
        Self {
            store,
            sequencer,
            achievements,
            scorer,
            round_target,
        }
    }

    /// Open a new session for `owner`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn start(&self, owner: UserId) -> EngineResult<GameSession> {
        let id = self.store.next_id()?;
        let session = GameSession::new(id, owner, self.round_target, unix_millis());
        self.store.insert_session(&session)?;
        info!("session {id} started for user {owner}");
        Ok(session)
    }

    /// Fetch a session owned by `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] or [`EngineError::NotAuthorized`].
    pub fn session(&self, id: SessionId, caller: UserId) -> EngineResult<GameSession> {
        let session = self.store.session(id)?;
        if session.owner != caller {
            return Err(EngineError::NotAuthorized {
                user: caller,
                action: "access this session",
            });
        }
        Ok(session)
    }

    /// Pick the next location for an open session, skipping those already played.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SessionClosed`] if the session is closed.
    /// - [`EngineError::NoLocationsRemaining`] when the filter is exhausted.
    pub fn next_location(
        &self,
        id: SessionId,
        caller: UserId,
        filter: CategoryFilter,
    ) -> EngineResult<Location> {
        let session = self.session(id, caller)?;
        if !session.is_open() {
            return Err(EngineError::SessionClosed { session: id });
        }
        self.sequencer
            .next(filter, &session.used_locations)
            .inspect_err(EngineError::warn_if_unavailable)
    }

    /// Score a guess for `location` in session `id`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::SessionClosed`] if the session is closed.
    /// - [`EngineError::LocationAlreadyUsed`] if the location was already played.
    /// - Lookup and storage failures.
    pub fn submit_guess(
        &self,
        id: SessionId,
        caller: UserId,
        location: LocationId,
        guessed: Coordinate,
    ) -> EngineResult<GuessOutcome> {
        let mut session = self.session(id, caller)?;
        if !session.is_open() {
            return Err(EngineError::SessionClosed { session: id });
        }
        let location = self
            .catalog()
            .location(location)
            .inspect_err(EngineError::warn_if_unavailable)?;
        let event = session.record_guess(&self.scorer, &location, guessed, unix_millis())?;
        self.store.update_session(&session)?;
        debug!(
            "session {id} round {}: {:.1} km, {} points",
            event.round, event.distance_km, event.score
        );

        let closed = !session.is_open();
        let achievements = if closed {
            info!("session {id} closed with {} points", session.total_score());
            self.evaluate_achievements(&session)
        } else {
            None
        };

        Ok(GuessOutcome {
            event,
            total_score: session.total_score(),
            closed,
            achievements,
        })
    }

    /// Close a session early. Closing a closed session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns lookup, authorization and storage failures.
    pub fn end(&self, id: SessionId, caller: UserId) -> EngineResult<GameSession> {
        let mut session = self.session(id, caller)?;
        if session.end(unix_millis()) {
            self.store.update_session(&session)?;
            info!("session {id} ended after {} rounds", session.round_index());
            self.evaluate_achievements(&session);
        }
        Ok(session)
    }

    /// All sessions owned by `owner`.
    ///
    /// # Errors
    ///
    /// Propagates storage failures.
    pub fn sessions_for(&self, owner: UserId) -> EngineResult<Vec<GameSession>> {
        self.store.sessions_for(owner)
    }

    fn catalog(&self) -> &Arc<dyn Catalog> {
        self.sequencer.catalog()
    }

    /// Achievements are a side effect of closing; a failure here is logged
    /// and does not undo the close.
    fn evaluate_achievements(&self, session: &GameSession) -> Option<AchievementReport> {
        let evaluate = || -> EngineResult<AchievementReport> {
            let locations = session
                .events
                .iter()
                .map(|e| self.catalog().location(e.location))
                .collect::<EngineResult<Vec<_>>>()?;
            let guesses: Vec<ScoredGuess<'_>> = locations
                .iter()
                .zip(&session.events)
                .map(|(location, event)| ScoredGuess {
                    location,
                    points: event.score,
                })
                .collect();
            self.achievements.evaluate(session.owner, &guesses)
        };

        match evaluate() {
            Ok(report) => Some(report),
            Err(e) => {
                warn!("achievement evaluation failed for session {}: {e}", session.id);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::MemoryAchievementCatalog;
    use crate::catalog::{Difficulty, MemoryCatalog};
    use crate::config::ScoringConfig;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// A catalog that can be taken offline.
    #[derive(Debug)]
    struct FlakyCatalog {
        inner: MemoryCatalog,
        down: AtomicBool,
    }

    impl FlakyCatalog {
        fn check(&self) -> EngineResult<()> {
            if self.down.load(Ordering::SeqCst) {
                return Err(EngineError::unavailable("location catalog", "503"));
            }
            Ok(())
        }
    }

    impl Catalog for FlakyCatalog {
        fn location(&self, id: LocationId) -> EngineResult<Location> {
            self.check()?;
            self.inner.location(id)
        }

        fn list_locations(
            &self,
            filter: CategoryFilter,
            excluding: &BTreeSet<LocationId>,
        ) -> EngineResult<Vec<Location>> {
            self.check()?;
            self.inner.list_locations(filter, excluding)
        }
    }

    fn location(id: LocationId, lat: f64, lon: f64) -> Location {
        Location {
            id,
            coordinate: Coordinate::new(lat, lon).unwrap(),
            category: 1,
            difficulty: Difficulty::Easy,
            image: String::new(),
            country: None,
        }
    }

    #[test]
    fn test_new_session_is_open_at_round_zero() {
        let session = GameSession::new(1, 7, DEFAULT_SESSION_ROUNDS, 0);
        assert!(session.is_open());
        assert_eq!(session.round_index(), 0);
        assert_eq!(session.total_score(), 0);
    }

    #[test]
    fn test_closes_after_round_target() {
        let scorer = Scorer::default();
        let mut session = GameSession::new(1, 7, DEFAULT_SESSION_ROUNDS, 0);

        for id in 1..=5 {
            assert!(session.is_open());
            let loc = location(id, 10.0, 10.0);
            let event = session.record_guess(&scorer, &loc, loc.coordinate, 100).unwrap();
            assert_eq!(u64::from(event.round), id);
            assert_eq!(event.score, 5000);
        }

        assert!(!session.is_open());
        assert_eq!(session.ended_at, Some(100));
        assert_eq!(session.total_score(), 25_000);

        let extra = location(6, 0.0, 0.0);
        assert_eq!(
            session.record_guess(&scorer, &extra, extra.coordinate, 200),
            Err(EngineError::SessionClosed { session: 1 })
        );
    }

    #[test]
    fn test_rejects_repeated_location() {
        let scorer = Scorer::default();
        let mut session = GameSession::new(3, 7, DEFAULT_SESSION_ROUNDS, 0);
        let loc = location(42, 0.0, 0.0);

        session.record_guess(&scorer, &loc, loc.coordinate, 1).unwrap();
        assert_eq!(
            session.record_guess(&scorer, &loc, loc.coordinate, 2),
            Err(EngineError::LocationAlreadyUsed {
                session: 3,
                location: 42
            })
        );
        assert_eq!(session.round_index(), 1);
    }

    #[test]
    fn test_total_score_does_not_wrap() {
        let scorer = Scorer::new(ScoringConfig {
            max_points: u32::MAX,
            ..ScoringConfig::default()
        });
        let mut session = GameSession::new(1, 7, 3, 0);
        for id in 1..=3 {
            let loc = location(id, 0.0, 0.0);
            session.record_guess(&scorer, &loc, loc.coordinate, 1).unwrap();
        }
        assert_eq!(session.total_score(), 3 * u64::from(u32::MAX));
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut session = GameSession::new(1, 7, DEFAULT_SESSION_ROUNDS, 0);
        assert!(session.end(10));
        assert!(!session.end(20));
        assert_eq!(session.ended_at, Some(10));
    }

    #[test]
    fn test_event_keeps_actual_coordinate() {
        let scorer = Scorer::default();
        let mut session = GameSession::new(1, 7, DEFAULT_SESSION_ROUNDS, 0);
        let loc = location(5, 48.8566, 2.3522);
        let guess = Coordinate::new(51.5074, -0.1278).unwrap();

        let event = session.record_guess(&scorer, &loc, guess, 1).unwrap();
        drop(loc);

        assert_eq!(event.actual, Coordinate::new(48.8566, 2.3522).unwrap());
        assert!(event.score > 0 && event.score < 5000);
        assert_eq!(scorer.score(event.guessed, event.actual).points, event.score);
    }

    #[test]
    fn test_catalog_failure_is_propagated_without_changes() {
        let catalog = Arc::new(FlakyCatalog {
            inner: MemoryCatalog::new((1..=6).map(|id| location(id, 1.0, 1.0))),
            down: AtomicBool::new(false),
        });
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let sessions = SessionService::new(
            Arc::clone(&store),
            Arc::new(LocationSequencer::new(catalog.clone(), Some(1))),
            Arc::new(AchievementEvaluator::new(
                Arc::new(MemoryAchievementCatalog::standard()),
                Arc::clone(&store),
            )),
            Scorer::default(),
            DEFAULT_SESSION_ROUNDS,
        );
        let session = sessions.start(7).unwrap();
        let first = sessions.next_location(session.id, 7, CategoryFilter::Random).unwrap();
        sessions
            .submit_guess(session.id, 7, first.id, first.coordinate)
            .unwrap();

        catalog.down.store(true, Ordering::SeqCst);
        let unavailable = EngineError::DependencyUnavailable {
            dependency: "location catalog",
            reason: "503".to_string(),
        };
        assert_eq!(
            sessions.next_location(session.id, 7, CategoryFilter::Random),
            Err(unavailable.clone())
        );
        let other = if first.id == 1 { 2 } else { 1 };
        assert_eq!(
            sessions.submit_guess(session.id, 7, other, first.coordinate),
            Err(unavailable)
        );

        let stored = sessions.session(session.id, 7).unwrap();
        assert!(stored.is_open());
        assert_eq!(stored.round_index(), 1);
        assert_eq!(stored.used_locations, BTreeSet::from([first.id]));
    }
}
