//! Location catalog.
//!
//! Locations are created and managed outside the engine; the engine only reads
//! them through the [`Catalog`] trait. [`MemoryCatalog`] is the in-process
//! implementation used by the CLI and tests, loadable from a JSON array.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::{EngineError, EngineResult};
use crate::geo::Coordinate;

/// Unique identifier for a location.
pub type LocationId = u64;

/// Unique identifier for a location category.
pub type CategoryId = u64;

/// Difficulty tier of a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Well-known, easy to place.
    Easy,
    /// Moderate.
    Medium,
    /// Obscure.
    Hard,
}

/// A playable location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier.
    pub id: LocationId,
    /// Where the location actually is.
    pub coordinate: Coordinate,
    /// Category the location belongs to.
    pub category: CategoryId,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Reference to the image shown to the player.
    pub image: String,
    /// ISO country code, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Which locations a selection may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    /// Any category.
    #[default]
    Random,
    /// Only the given category.
    Category(CategoryId),
}

impl CategoryFilter {
    /// Whether a location passes this filter.
    #[must_use]
    pub fn matches(&self, location: &Location) -> bool {
        match self {
            Self::Random => true,
            Self::Category(id) => location.category == *id,
        }
    }
}

impl From<Option<CategoryId>> for CategoryFilter {
    fn from(category: Option<CategoryId>) -> Self {
        category.map_or(Self::Random, Self::Category)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "any category"),
            Self::Category(id) => write!(f, "category {id}"),
        }
    }
}

/// Read access to the location catalog.
pub trait Catalog: Send + Sync + fmt::Debug {
    /// Look up a single location.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotFound`] for an unknown id, or
    /// [`EngineError::DependencyUnavailable`] if the catalog cannot be reached.
    fn location(&self, id: LocationId) -> EngineResult<Location>;

    /// List locations matching `filter` whose ids are not in `excluding`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DependencyUnavailable`] if the catalog cannot be reached.
    fn list_locations(
        &self,
        filter: CategoryFilter,
        excluding: &BTreeSet<LocationId>,
    ) -> EngineResult<Vec<Location>>;
}

/// In-memory catalog keyed by location id.
///
/// Iteration order is by id, so selections with a seeded RNG are reproducible.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    locations: BTreeMap<LocationId, Location>,
}

impl MemoryCatalog {
    /// Create a catalog from a list of locations. Later duplicates win.
    #[must_use]
    pub fn new(locations: impl IntoIterator<Item = Location>) -> Self {
        Self {
            locations: locations.into_iter().map(|l| (l.id, l)).collect(),
        }
    }

    /// Load a catalog from a JSON array of locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid location list.
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let locations: Vec<Location> = serde_json::from_str(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(Self::new(locations))
    }

    /// Add or replace a location.
    pub fn insert(&mut self, location: Location) {
        self.locations.insert(location.id, location);
    }

    /// Number of locations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Catalog for MemoryCatalog {
    fn location(&self, id: LocationId) -> EngineResult<Location> {
        self.locations
            .get(&id)
            .cloned()
            .ok_or(EngineError::NotFound {
                entity: "location",
                id,
            })
    }

    fn list_locations(
        &self,
        filter: CategoryFilter,
        excluding: &BTreeSet<LocationId>,
    ) -> EngineResult<Vec<Location>> {
        Ok(self
            .locations
            .values()
            .filter(|l| filter.matches(l) && !excluding.contains(&l.id))
            .cloned()
            .collect())
    }
}
