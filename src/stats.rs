//! Per-player records over completed challenges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::challenge::{ChallengeOutcome, ChallengeStatus};
use crate::error::EngineResult;
use crate::identity::UserId;
use crate::store::Store;

/// Win/draw/loss record of one player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerRecord {
    /// The player.
    pub user: UserId,
    /// Completed challenges played.
    pub played: u64,
    /// Challenges won.
    pub wins: u64,
    /// Challenges lost.
    pub losses: u64,
    /// Challenges drawn.
    pub draws: u64,
    /// Sum of the player's round scores over completed challenges.
    pub total_points: u64,
}

impl PlayerRecord {
    /// An empty record for `user`.
    #[must_use]
    pub const fn new(user: UserId) -> Self {
        Self {
            user,
            played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            total_points: 0,
        }
    }

    /// Fold one completed challenge into the record.
    pub fn add(&mut self, outcome: ChallengeOutcome, points: u64) {
        self.played += 1;
        self.total_points += points;
        match outcome {
            ChallengeOutcome::Draw => self.draws += 1,
            ChallengeOutcome::Winner(user) if user == self.user => self.wins += 1,
            ChallengeOutcome::Winner(_) => self.losses += 1,
        }
    }

    /// Combine two records of the same player.
    pub fn merge(&mut self, other: &Self) {
        self.played += other.played;
        self.wins += other.wins;
        self.losses += other.losses;
        self.draws += other.draws;
        self.total_points += other.total_points;
    }

    /// Fraction of played challenges won (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self) -> f64 {
        if self.played == 0 {
            return 0.0;
        }
        self.wins as f64 / self.played as f64
    }
}

/// Records for `users` over every completed challenge they played.
///
/// # Errors
///
/// Propagates storage failures.
pub fn player_records(store: &dyn Store, users: &[UserId]) -> EngineResult<Vec<PlayerRecord>> {
    let mut records: BTreeMap<UserId, PlayerRecord> =
        users.iter().map(|&u| (u, PlayerRecord::new(u))).collect();
    let mut seen = std::collections::BTreeSet::new();

    for &user in users {
        for challenge in store.challenges_for(user)? {
            if challenge.status != ChallengeStatus::Completed || !seen.insert(challenge.id) {
                continue;
            }
            let Some(outcome) = challenge.outcome else {
                continue;
            };
            let scores = store.round_scores(challenge.id)?;
            for player in challenge.players() {
                let Some(record) = records.get_mut(&player) else {
                    continue;
                };
                let points = scores
                    .iter()
                    .filter(|s| s.user == player)
                    .map(|s| u64::from(s.score))
                    .sum();
                record.add(outcome, points);
            }
        }
    }

    Ok(records.into_values().collect())
}

/// Sort records by wins, then total points (both descending), then user id.
#[must_use]
pub fn leaderboard(mut records: Vec<PlayerRecord>) -> Vec<PlayerRecord> {
    records.sort_by(|a, b| {
        b.wins
            .cmp(&a.wins)
            .then(b.total_points.cmp(&a.total_points))
            .then(a.user.cmp(&b.user))
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::{Challenge, ChallengeRoundScore};
    use crate::geo::Coordinate;
    use crate::store::MemoryStore;

    fn completed(store: &MemoryStore, id: u64, a: UserId, b: UserId, points: [u32; 2]) {
        let mut challenge = Challenge::new(id, a, b, Vec::new(), 0);
        challenge.status = ChallengeStatus::InProgress;
        store.insert_challenge(&challenge).unwrap();
        for (user, score) in [(a, points[0]), (b, points[1])] {
            store
                .insert_round_score(&ChallengeRoundScore {
                    challenge: id,
                    user,
                    round: 1,
                    score,
                    distance_km: 0.0,
                    guessed: Coordinate::new(0.0, 0.0).unwrap(),
                    submitted_at: 0,
                })
                .unwrap();
        }
        let outcome = match points[0].cmp(&points[1]) {
            std::cmp::Ordering::Greater => ChallengeOutcome::Winner(a),
            std::cmp::Ordering::Less => ChallengeOutcome::Winner(b),
            std::cmp::Ordering::Equal => ChallengeOutcome::Draw,
        };
        store.complete_challenge(id, outcome, 1).unwrap();
    }

    #[test]
    fn test_records_count_each_challenge_once() {
        let store = MemoryStore::new();
        completed(&store, 1, 1, 2, [500, 100]);
        completed(&store, 2, 2, 1, [700, 300]);
        completed(&store, 3, 1, 3, [50, 50]);
        // Still pending: ignored.
        store.insert_challenge(&Challenge::new(4, 1, 2, Vec::new(), 0)).unwrap();

        let records = player_records(&store, &[1, 2, 3]).unwrap();
        let one = records[0];
        assert_eq!((one.played, one.wins, one.losses, one.draws), (3, 1, 1, 1));
        assert_eq!(one.total_points, 850);
        assert_eq!(records[1].played, 2);
        assert_eq!(records[2].draws, 1);
    }

    #[test]
    fn test_leaderboard_ordering() {
        let mut a = PlayerRecord::new(1);
        a.wins = 2;
        a.total_points = 10;
        let mut b = PlayerRecord::new(2);
        b.wins = 2;
        b.total_points = 20;
        let mut c = PlayerRecord::new(3);
        c.wins = 2;
        c.total_points = 20;
        let d = PlayerRecord::new(4);

        let order: Vec<UserId> = leaderboard(vec![d, a, c, b]).iter().map(|r| r.user).collect();
        assert_eq!(order, vec![2, 3, 1, 4]);
    }

    #[test]
    fn test_merge_and_win_rate() {
        let mut a = PlayerRecord::new(1);
        a.add(ChallengeOutcome::Winner(1), 100);
        let mut b = PlayerRecord::new(1);
        b.add(ChallengeOutcome::Winner(2), 50);
        b.add(ChallengeOutcome::Draw, 25);
        a.merge(&b);
        assert_eq!(a.played, 3);
        assert_eq!(a.total_points, 175);
        assert!((a.win_rate() - 1.0 / 3.0).abs() < 1e-12);
        assert!(PlayerRecord::new(9).win_rate().abs() < f64::EPSILON);
    }
}
