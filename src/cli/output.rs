//! Output formatting utilities for CLI.

use geoduel::achievement::AchievementReport;
use geoduel::challenge::ChallengeCompletion;
use geoduel::session::GameSession;
use geoduel::stats::PlayerRecord;
use geoduel::{ChallengeOutcome, GeoScore, Tier, tier_of};
use serde::Serialize;
use std::fmt::Write;

/// JSON-serializable single score.
#[derive(Debug, Serialize)]
pub(super) struct JsonScore {
    /// Great-circle distance in kilometres.
    pub(super) distance_km: f64,
    /// Points awarded.
    pub(super) points: u32,
    /// Tier of the points.
    pub(super) tier: Tier,
}

impl JsonScore {
    /// Create from a GeoScore.
    pub(super) fn from_score(score: GeoScore) -> Self {
        Self {
            distance_km: score.distance_km,
            points: score.points,
            tier: tier_of(score.points),
        }
    }
}

/// JSON-serializable solo session.
#[derive(Debug, Serialize)]
pub(super) struct JsonSession {
    /// Session id.
    session: u64,
    /// Total points.
    total: u64,
    /// Per-round results.
    rounds: Vec<JsonRound>,
    /// Achievements earned on close.
    newly_earned: Vec<String>,
}

/// JSON-serializable solo round.
#[derive(Debug, Serialize)]
pub(super) struct JsonRound {
    /// Round number.
    round: u8,
    /// Location played.
    location: u64,
    /// Distance in kilometres.
    distance_km: f64,
    /// Points awarded.
    points: u32,
}

impl JsonSession {
    /// Create from a closed session and its achievement report.
    pub(super) fn from_session(session: &GameSession, report: Option<&AchievementReport>) -> Self {
        Self {
            session: session.id,
            total: session.total_score(),
            rounds: session
                .events
                .iter()
                .map(|e| JsonRound {
                    round: e.round,
                    location: e.location,
                    distance_km: e.distance_km,
                    points: e.score,
                })
                .collect(),
            newly_earned: report
                .map(|r| r.newly_earned.iter().map(|a| a.name.clone()).collect())
                .unwrap_or_default(),
        }
    }
}

/// Format a solo session as human-readable text.
pub(super) fn format_session_text(session: &GameSession, report: Option<&AchievementReport>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Session {} ({} rounds)", session.id, session.events.len());
    for event in &session.events {
        let _ = writeln!(
            output,
            "  Round {}: location {}, {:.1} km, {} points",
            event.round, event.location, event.distance_km, event.score
        );
    }
    let _ = writeln!(output, "  Total: {} points", session.total_score());

    if let Some(top) = report.and_then(|r| r.headline.as_ref()) {
        let _ = writeln!(output, "  Achievement unlocked: {} ({})", top.name, top.tier());
    }

    output
}

/// Aggregated statistics of a simulation run.
#[derive(Debug, Default)]
pub(super) struct SimulationStats {
    /// Challenges created.
    pub(super) challenges: u64,
    /// Challenges that reached `completed`.
    pub(super) completed: u64,
    /// Completions that ended in a draw.
    pub(super) draws: u64,
    /// Completion events emitted (must equal `completed`).
    pub(super) completion_events: u64,
    /// Duplicate submissions rejected as already scored.
    pub(super) duplicates_rejected: u64,
    /// Achievements newly earned across all completions.
    pub(super) achievements_earned: u64,
    /// Sum of all round scores.
    pub(super) total_points: u64,
    /// Rounds scored.
    pub(super) rounds_scored: u64,
    /// Operations that failed.
    pub(super) errors: u64,
}

impl SimulationStats {
    /// Record one emitted completion.
    pub(super) fn add_completion(&mut self, completion: &ChallengeCompletion) {
        self.completion_events += 1;
        if completion.outcome == ChallengeOutcome::Draw {
            self.draws += 1;
        }
        self.achievements_earned += completion
            .achievements
            .iter()
            .map(|r| r.newly_earned.len() as u64)
            .sum::<u64>();
    }

    /// Merge another stats into this one.
    pub(super) fn merge(&mut self, other: &Self) {
        self.challenges += other.challenges;
        self.completed += other.completed;
        self.draws += other.draws;
        self.completion_events += other.completion_events;
        self.duplicates_rejected += other.duplicates_rejected;
        self.achievements_earned += other.achievements_earned;
        self.total_points += other.total_points;
        self.rounds_scored += other.rounds_scored;
        self.errors += other.errors;
    }

    /// Average points per scored round.
    #[allow(clippy::cast_precision_loss)]
    pub(super) fn avg_round_points(&self) -> f64 {
        if self.rounds_scored == 0 {
            return 0.0;
        }
        self.total_points as f64 / self.rounds_scored as f64
    }
}

/// JSON-serializable simulation result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSimulation {
    challenges: u64,
    completed: u64,
    draws: u64,
    completion_events: u64,
    duplicates_rejected: u64,
    achievements_earned: u64,
    avg_round_points: f64,
    errors: u64,
    leaderboard: Vec<JsonPlayer>,
}

/// JSON-serializable leaderboard row.
#[derive(Debug, Serialize)]
struct JsonPlayer {
    user: u64,
    played: u64,
    wins: u64,
    losses: u64,
    draws: u64,
    win_rate: f64,
    total_points: u64,
}

impl JsonSimulation {
    /// Create from stats and the leaderboard.
    pub(super) fn from_stats(stats: &SimulationStats, leaderboard: &[PlayerRecord]) -> Self {
        Self {
            challenges: stats.challenges,
            completed: stats.completed,
            draws: stats.draws,
            completion_events: stats.completion_events,
            duplicates_rejected: stats.duplicates_rejected,
            achievements_earned: stats.achievements_earned,
            avg_round_points: stats.avg_round_points(),
            errors: stats.errors,
            leaderboard: leaderboard
                .iter()
                .map(|r| JsonPlayer {
                    user: r.user,
                    played: r.played,
                    wins: r.wins,
                    losses: r.losses,
                    draws: r.draws,
                    win_rate: r.win_rate(),
                    total_points: r.total_points,
                })
                .collect(),
        }
    }
}

/// Format simulation stats as human-readable text.
pub(super) fn format_simulation_text(stats: &SimulationStats, leaderboard: &[PlayerRecord]) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Simulation Results ({} challenges)", stats.challenges);
    output.push_str("========================================\n\n");
    let _ = writeln!(output, "  Completed: {}", stats.completed);
    let _ = writeln!(output, "  Completion events: {}", stats.completion_events);
    let _ = writeln!(output, "  Draws: {}", stats.draws);
    let _ = writeln!(output, "  Duplicate submissions rejected: {}", stats.duplicates_rejected);
    let _ = writeln!(output, "  Achievements earned: {}", stats.achievements_earned);
    let _ = writeln!(output, "  Average round points: {:.0}", stats.avg_round_points());
    if stats.errors > 0 {
        let _ = writeln!(output, "  Errors: {}", stats.errors);
    }

    output.push_str("\nLeaderboard:\n");
    for (rank, record) in leaderboard.iter().enumerate() {
        let _ = writeln!(
            output,
            "  {:>2}. user {:<4} {:>3}W {:>3}D {:>3}L  {:.1}%  {} points",
            rank + 1,
            record.user,
            record.wins,
            record.draws,
            record.losses,
            record.win_rate() * 100.0,
            record.total_points
        );
    }

    output
}

/// Format the leaderboard as CSV.
pub(super) fn format_simulation_csv(leaderboard: &[PlayerRecord]) -> String {
    let mut output = String::from("rank,user,played,wins,draws,losses,win_rate,total_points\n");
    for (rank, r) in leaderboard.iter().enumerate() {
        let _ = writeln!(
            output,
            "{},{},{},{},{},{},{:.4},{}",
            rank + 1,
            r.user,
            r.played,
            r.wins,
            r.draws,
            r.losses,
            r.win_rate(),
            r.total_points
        );
    }
    output
}
