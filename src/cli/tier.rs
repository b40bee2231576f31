//! Tier command implementation.

use super::CliError;
use geoduel::achievement::{DIAMOND_POINTS, GOLD_POINTS, SILVER_POINTS};
use geoduel::tier_of;

/// Execute the tier command.
///
/// # Errors
///
/// Never fails; the signature matches the other commands.
#[allow(clippy::unnecessary_wraps)]
pub(crate) fn execute(points: u32) -> Result<(), CliError> {
    let tier = tier_of(points);
    let next = [SILVER_POINTS, GOLD_POINTS, DIAMOND_POINTS]
        .into_iter()
        .find(|&threshold| threshold > points);

    match next {
        Some(threshold) => println!(
            "{points} points: {tier} ({} more for {})",
            threshold - points,
            tier_of(threshold)
        ),
        None => println!("{points} points: {tier}"),
    }

    Ok(())
}
