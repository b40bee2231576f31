//! Simulate command implementation.

use super::output::{JsonSimulation, SimulationStats, format_simulation_csv, format_simulation_text};
use super::{CliError, SimulateFormat, load_catalog, load_config, simulated_guess};
use geoduel::achievement::MemoryAchievementCatalog;
use geoduel::challenge::{ChallengeId, ROUNDS_PER_CHALLENGE};
use geoduel::stats::{leaderboard, player_records};
use geoduel::{ChallengeStatus, Engine, MemoryFriendGraph, MemoryStore, UserId};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Number of simulated players. Everyone is friends with everyone.
const PLAYERS: u64 = 8;

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the catalog or config cannot be loaded, or the snapshot cannot be written.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    catalog: PathBuf,
    challenges: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    format: SimulateFormat,
    progress: bool,
    save: Option<PathBuf>,
    config: Option<&Path>,
) -> Result<(), CliError> {
    let mut config = load_config(config)?;
    if seed.is_some() {
        config.seed = seed;
    }
    let catalog = load_catalog(&catalog)?;

    let users: Vec<UserId> = (1..=PLAYERS).collect();
    let friends = Arc::new(MemoryFriendGraph::new());
    for &a in &users {
        for &b in users.iter().filter(|&&b| b > a) {
            friends.befriend(a, b)?;
        }
    }

    let store = Arc::new(MemoryStore::new());
    let engine = Engine::new(
        config,
        Arc::clone(&store) as Arc<dyn geoduel::Store>,
        Arc::new(catalog),
        friends,
        Arc::new(MemoryAchievementCatalog::standard()),
    )?;

    if let Some(num_threads) = threads {
        configure_thread_pool(num_threads);
    }

    let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());

    let pb = if progress {
        let pb = ProgressBar::new(challenges);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} challenges ({per_sec})")
                .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each worker accumulates its own stats; results are merged at the end.
    let stats = (0..challenges)
        .into_par_iter()
        .fold(SimulationStats::default, |mut local, i| {
            local.merge(&play_challenge(&engine, base_seed.wrapping_add(i), i));
            if let Some(pb) = &pb {
                pb.inc(1);
            }
            local
        })
        .reduce(SimulationStats::default, |mut a, b| {
            a.merge(&b);
            a
        });

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }
    let duration = start.elapsed();

    if stats.completion_events != stats.completed {
        log::error!(
            "{} completion events for {} completed challenges",
            stats.completion_events,
            stats.completed
        );
    }

    let board = leaderboard(player_records(engine.store().as_ref(), &users)?);

    match format {
        SimulateFormat::Text => {
            println!();
            print!("{}", format_simulation_text(&stats, &board));
            println!();
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        SimulateFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonSimulation::from_stats(&stats, &board))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        SimulateFormat::Csv => print!("{}", format_simulation_csv(&board)),
    }

    if let Some(path) = save {
        store
            .save_snapshot(&path)
            .map_err(|e| CliError::new(format!("Failed to write {}: {e}", path.display())))?;
        log::info!("snapshot written to {}", path.display());
    }

    Ok(())
}

/// The two players of challenge number `index`. Always distinct.
fn pairing(index: u64) -> (UserId, UserId) {
    let a = index % PLAYERS;
    let offset = 1 + (index / PLAYERS) % (PLAYERS - 1);
    (1 + a, 1 + (a + offset) % PLAYERS)
}

/// Create, accept and start one challenge, then let both players submit
/// concurrently.
fn play_challenge(engine: &Engine, seed: u64, index: u64) -> SimulationStats {
    let mut stats = SimulationStats {
        challenges: 1,
        ..SimulationStats::default()
    };
    let (challenger, challenged) = pairing(index);
    let challenges = engine.challenges();

    let setup = challenges.create(challenger, challenged).and_then(|c| {
        challenges.respond(c.id, challenged, true)?;
        challenges.start(c.id, challenger)
    });
    let id = match setup {
        Ok(challenge) => challenge.id,
        Err(e) => {
            log::warn!("challenge setup failed for {challenger} vs {challenged}: {e}");
            stats.errors += 1;
            return stats;
        }
    };

    let (a, b) = rayon::join(
        || play_rounds(engine, id, challenger, seed),
        || play_rounds(engine, id, challenged, seed.rotate_left(32)),
    );
    stats.merge(&a);
    stats.merge(&b);

    match challenges.challenge(id, challenger) {
        Ok(c) if c.status == ChallengeStatus::Completed => stats.completed += 1,
        Ok(c) => log::warn!("challenge {id} ended the run as {}", c.status),
        Err(e) => {
            log::warn!("challenge {id} could not be read back: {e}");
            stats.errors += 1;
        }
    }
    stats
}

/// Play every round for `user`, occasionally resubmitting a round to
/// exercise duplicate handling.
fn play_rounds(engine: &Engine, id: ChallengeId, user: UserId, seed: u64) -> SimulationStats {
    let mut stats = SimulationStats::default();
    let mut rng = StdRng::seed_from_u64(seed);
    let challenges = engine.challenges();
    let spread = rng.random_range(0.5..30.0);

    for round in 1..=ROUNDS_PER_CHALLENGE {
        let location = match challenges.location_for_round(id, user, round) {
            Ok(location) => location,
            Err(e) => {
                log::warn!("challenge {id} round {round}: {e}");
                stats.errors += 1;
                return stats;
            }
        };
        let guess = simulated_guess(location.coordinate, spread, &mut rng);

        match challenges.submit_round_guess(id, user, round, guess) {
            Ok(submission) => {
                stats.rounds_scored += 1;
                stats.total_points += u64::from(submission.score.score);
                if let Some(completion) = &submission.completion {
                    stats.add_completion(completion);
                }
            }
            Err(e) => {
                log::warn!("challenge {id} round {round} for user {user}: {e}");
                stats.errors += 1;
                return stats;
            }
        }

        if rng.random_bool(0.3) {
            match challenges.submit_round_guess(id, user, round, guess) {
                Err(e) if e.is_idempotent_success() => stats.duplicates_rejected += 1,
                Err(e) => {
                    log::warn!("duplicate of challenge {id} round {round}: {e}");
                    stats.errors += 1;
                }
                Ok(_) => {
                    log::error!("duplicate of challenge {id} round {round} was scored twice");
                    stats.errors += 1;
                }
            }
        }
    }
    stats
}

/// Size the global rayon pool. Returns whether the size was applied; the
/// pool can only be built once per process.
fn configure_thread_pool(num_threads: usize) -> bool {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => true,
        Err(e) => {
            debug!("keeping existing thread pool: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_pool_is_sized_once() {
        configure_thread_pool(2);
        assert!(!configure_thread_pool(3));
    }

    #[test]
    fn test_pairing_never_pairs_a_player_with_themselves() {
        for i in 0..500 {
            let (a, b) = pairing(i);
            assert_ne!(a, b);
            assert!((1..=PLAYERS).contains(&a));
            assert!((1..=PLAYERS).contains(&b));
        }
    }
}
