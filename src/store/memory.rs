//! In-process [`Store`] backed by a single `RwLock`.
//!
//! Every trait method takes the lock once, so uniqueness checks and
//! compare-and-set transitions are atomic with their writes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::achievement::AchievementId;
use crate::challenge::{
    Challenge, ChallengeId, ChallengeOutcome, ChallengeRoundScore, ChallengeStatus,
};
use crate::error::{EngineError, EngineResult};
use crate::identity::UserId;
use crate::session::{GameSession, SessionId};
use crate::store::Store;

/// Format marker written at the top of every snapshot.
const SNAPSHOT_FORMAT: &str = "geoduel-snapshot";

/// Current snapshot version.
const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Tables {
    last_id: u64,
    sessions: BTreeMap<SessionId, GameSession>,
    challenges: BTreeMap<ChallengeId, Challenge>,
    round_scores: BTreeMap<ChallengeId, Vec<ChallengeRoundScore>>,
    achievements: BTreeMap<UserId, BTreeSet<AchievementId>>,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    format: String,
    version: u32,
    tables: Tables,
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every table to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned, or if serialization or file I/O fails.
    pub fn save_snapshot(&self, path: &Path) -> io::Result<()> {
        let tables = self
            .tables
            .read()
            .map_err(|e| io::Error::other(e.to_string()))?;
        let snapshot = SnapshotRef {
            format: SNAPSHOT_FORMAT,
            version: SNAPSHOT_VERSION,
            tables: &tables,
        };

        let mut writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, &snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writer.flush()
    }

    /// Restore a store written by [`MemoryStore::save_snapshot`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a snapshot, or has
    /// an unsupported version.
    pub fn load_snapshot(path: &Path) -> io::Result<Self> {
        let reader = BufReader::new(fs::File::open(path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "not a geoduel snapshot",
            ));
        }
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported snapshot version: {}", snapshot.version),
            ));
        }

        Ok(Self {
            tables: RwLock::new(snapshot.tables),
        })
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|e| EngineError::unavailable("store", e))
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|e| EngineError::unavailable("store", e))
    }
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format: &'a str,
    version: u32,
    tables: &'a Tables,
}

const fn session_missing(id: SessionId) -> EngineError {
    EngineError::NotFound {
        entity: "session",
        id,
    }
}

const fn challenge_missing(id: ChallengeId) -> EngineError {
    EngineError::NotFound {
        entity: "challenge",
        id,
    }
}

impl Store for MemoryStore {
    fn next_id(&self) -> EngineResult<u64> {
        let mut tables = self.write()?;
        tables.last_id += 1;
        Ok(tables.last_id)
    }

    fn insert_session(&self, session: &GameSession) -> EngineResult<()> {
        self.write()?.sessions.insert(session.id, session.clone());
        Ok(())
    }

    fn session(&self, id: SessionId) -> EngineResult<GameSession> {
        self.read()?
            .sessions
            .get(&id)
            .cloned()
            .ok_or_else(|| session_missing(id))
    }

    fn update_session(&self, session: &GameSession) -> EngineResult<()> {
        let mut tables = self.write()?;
        let slot = tables
            .sessions
            .get_mut(&session.id)
            .ok_or_else(|| session_missing(session.id))?;
        *slot = session.clone();
        Ok(())
    }

    fn sessions_for(&self, user: UserId) -> EngineResult<Vec<GameSession>> {
        Ok(self
            .read()?
            .sessions
            .values()
            .filter(|s| s.owner == user)
            .cloned()
            .collect())
    }

    fn insert_challenge(&self, challenge: &Challenge) -> EngineResult<()> {
        self.write()?
            .challenges
            .insert(challenge.id, challenge.clone());
        Ok(())
    }

    fn challenge(&self, id: ChallengeId) -> EngineResult<Challenge> {
        self.read()?
            .challenges
            .get(&id)
            .cloned()
            .ok_or_else(|| challenge_missing(id))
    }

    fn challenges_for(&self, user: UserId) -> EngineResult<Vec<Challenge>> {
        Ok(self
            .read()?
            .challenges
            .values()
            .filter(|c| c.is_participant(user))
            .cloned()
            .collect())
    }

    fn transition_challenge(
        &self,
        id: ChallengeId,
        from: ChallengeStatus,
        to: ChallengeStatus,
    ) -> EngineResult<Challenge> {
        let mut tables = self.write()?;
        let challenge = tables
            .challenges
            .get_mut(&id)
            .ok_or_else(|| challenge_missing(id))?;

        if challenge.status != from || !from.can_transition_to(to) {
            return Err(EngineError::InvalidState {
                challenge: id,
                status: challenge.status,
                action: "transition",
            });
        }
        challenge.status = to;
        Ok(challenge.clone())
    }

    fn complete_challenge(
        &self,
        id: ChallengeId,
        outcome: ChallengeOutcome,
        completed_at: u64,
    ) -> EngineResult<Challenge> {
        let mut tables = self.write()?;
        let challenge = tables
            .challenges
            .get_mut(&id)
            .ok_or_else(|| challenge_missing(id))?;

        if challenge.status != ChallengeStatus::InProgress {
            return Err(EngineError::InvalidState {
                challenge: id,
                status: challenge.status,
                action: "complete",
            });
        }
        challenge.status = ChallengeStatus::Completed;
        challenge.outcome = Some(outcome);
        challenge.completed_at = Some(completed_at);
        Ok(challenge.clone())
    }

    fn insert_round_score(&self, score: &ChallengeRoundScore) -> EngineResult<()> {
        let mut tables = self.write()?;
        let rows = tables.round_scores.entry(score.challenge).or_default();
        if rows
            .iter()
            .any(|r| r.user == score.user && r.round == score.round)
        {
            return Err(EngineError::RoundAlreadyScored {
                challenge: score.challenge,
                user: score.user,
                round: score.round,
            });
        }
        rows.push(score.clone());
        rows.sort_by_key(|r| (r.user, r.round));
        Ok(())
    }

    fn round_scores(&self, challenge: ChallengeId) -> EngineResult<Vec<ChallengeRoundScore>> {
        Ok(self
            .read()?
            .round_scores
            .get(&challenge)
            .cloned()
            .unwrap_or_default())
    }

    fn earned_achievements(&self, user: UserId) -> EngineResult<BTreeSet<AchievementId>> {
        Ok(self
            .read()?
            .achievements
            .get(&user)
            .cloned()
            .unwrap_or_default())
    }

    fn record_achievements(&self, user: UserId, ids: &[AchievementId]) -> EngineResult<()> {
        self.write()?
            .achievements
            .entry(user)
            .or_default()
            .extend(ids.iter().copied());
        Ok(())
    }
}
