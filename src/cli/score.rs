//! Score command implementation.

use super::output::JsonScore;
use super::{CliError, OutputFormat, load_config};
use geoduel::{Coordinate, Scorer, tier_of};
use std::path::Path;

/// Execute the score command.
///
/// # Errors
///
/// Returns an error if a coordinate is out of range or the config is invalid.
pub(crate) fn execute(
    guessed: (f64, f64),
    actual: (f64, f64),
    format: OutputFormat,
    config: Option<&Path>,
) -> Result<(), CliError> {
    let config = load_config(config)?;
    let scorer = Scorer::new(config.scoring);

    let guessed = Coordinate::new(guessed.0, guessed.1)?;
    let actual = Coordinate::new(actual.0, actual.1)?;
    let score = scorer.score(guessed, actual);

    match format {
        OutputFormat::Text => {
            println!("Guess:    {guessed}");
            println!("Actual:   {actual}");
            println!("Distance: {:.1} km", score.distance_km);
            println!("Points:   {} ({})", score.points, tier_of(score.points));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonScore::from_score(score))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}
