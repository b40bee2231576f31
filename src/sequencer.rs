//! Location selection for solo rounds and challenge sequences.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::catalog::{Catalog, CategoryFilter, Location, LocationId};
use crate::challenge::ROUNDS_PER_CHALLENGE;
use crate::error::{EngineError, EngineResult};

/// A location pinned to a position in a challenge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedLocation {
    /// Position in the challenge, 1-based.
    pub order_index: u8,
    /// The location played at that position.
    pub location: Location,
}

/// Picks unused locations from a [`Catalog`].
pub struct LocationSequencer {
    catalog: Arc<dyn Catalog>,
    rng: Mutex<StdRng>,
}

impl fmt::Debug for LocationSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationSequencer")
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

impl LocationSequencer {
    /// Create a sequencer. A seed makes selections reproducible.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            catalog,
            rng: Mutex::new(rng),
        }
    }

    /// The catalog this sequencer draws from.
    #[must_use]
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Pick one location uniformly among those matching `filter` and not in `exclude`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoLocationsRemaining`] when no candidate is left,
    /// or propagates catalog failures.
    pub fn next(
        &self,
        filter: CategoryFilter,
        exclude: &BTreeSet<LocationId>,
    ) -> EngineResult<Location> {
        let mut candidates = self.catalog.list_locations(filter, exclude)?;
        if candidates.is_empty() {
            return Err(EngineError::NoLocationsRemaining { filter });
        }
        let index = self.rng()?.random_range(0..candidates.len());
        Ok(candidates.swap_remove(index))
    }

    /// Pick [`ROUNDS_PER_CHALLENGE`] distinct locations and number them 1..=N.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoLocationsRemaining`] when the catalog holds
    /// fewer matching locations than a challenge needs.
    pub fn challenge_sequence(&self, filter: CategoryFilter) -> EngineResult<Vec<SequencedLocation>> {
        let candidates = self.catalog.list_locations(filter, &BTreeSet::new())?;
        let needed = usize::from(ROUNDS_PER_CHALLENGE);
        if candidates.len() < needed {
            return Err(EngineError::NoLocationsRemaining { filter });
        }

        let picks = rand::seq::index::sample(&mut *self.rng()?, candidates.len(), needed);
        Ok(picks
            .into_iter()
            .zip(1..=ROUNDS_PER_CHALLENGE)
            .map(|(index, order_index)| SequencedLocation {
                order_index,
                location: candidates[index].clone(),
            })
            .collect())
    }

    fn rng(&self) -> EngineResult<std::sync::MutexGuard<'_, StdRng>> {
        self.rng
            .lock()
            .map_err(|e| EngineError::unavailable("location sequencer", e))
    }
}
