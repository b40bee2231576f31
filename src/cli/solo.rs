//! Solo command implementation.

use super::output::{JsonSession, format_session_text};
use super::{CliError, OutputFormat, load_catalog, load_config, simulated_guess};
use geoduel::{CategoryFilter, Engine, MemoryFriendGraph};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The simulated solo player.
const PLAYER: u64 = 1;

/// How far off a simulated guess may land, in degrees per axis.
const GUESS_SPREAD_DEG: f64 = 8.0;

/// Execute the solo command.
///
/// # Errors
///
/// Returns an error if the catalog or config cannot be loaded, or the session fails.
pub(crate) fn execute(
    catalog: PathBuf,
    category: Option<u64>,
    seed: Option<u64>,
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), CliError> {
    let mut config = load_config(config)?;
    if seed.is_some() {
        config.seed = seed;
    }
    let catalog = load_catalog(&catalog)?;
    let engine = Engine::in_memory(config, Arc::new(catalog), Arc::new(MemoryFriendGraph::new()))?;
    let sessions = engine.sessions();

    let mut rng = config
        .seed
        .map_or_else(StdRng::from_os_rng, |s| StdRng::seed_from_u64(s.wrapping_add(1)));
    let filter = CategoryFilter::from(category);

    let session = sessions.start(PLAYER)?;
    let mut report = None;
    loop {
        let location = match sessions.next_location(session.id, PLAYER, filter) {
            Ok(location) => location,
            Err(geoduel::EngineError::NoLocationsRemaining { .. }) => {
                log::warn!("catalog exhausted before the session target");
                sessions.end(session.id, PLAYER)?;
                break;
            }
            Err(e) => return Err(e.into()),
        };
        let guess = simulated_guess(location.coordinate, GUESS_SPREAD_DEG, &mut rng);
        let outcome = sessions.submit_guess(session.id, PLAYER, location.id, guess)?;
        if outcome.closed {
            report = outcome.achievements;
            break;
        }
    }

    let session = sessions.session(session.id, PLAYER)?;
    match format {
        OutputFormat::Text => print!("{}", format_session_text(&session, report.as_ref())),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonSession::from_session(&session, report.as_ref()))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
