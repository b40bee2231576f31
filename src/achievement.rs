//! Achievement tiers and newly-earned detection.
//!
//! An achievement is earned by a single scored guess reaching its
//! `points_required`, optionally restricted to a category and/or country.
//! Tiers are a pure classification of `points_required`.

use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::catalog::{CategoryId, Location};
use crate::error::EngineResult;
use crate::identity::UserId;
use crate::store::Store;

/// Unique identifier for an achievement.
pub type AchievementId = u64;

/// Minimum points for [`Tier::Silver`].
pub const SILVER_POINTS: u32 = 3500;
/// Minimum points for [`Tier::Gold`].
pub const GOLD_POINTS: u32 = 4000;
/// Minimum points for [`Tier::Diamond`].
pub const DIAMOND_POINTS: u32 = 4750;

/// Coarse classification of a points threshold. Ordered bronze < diamond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// 0 and up.
    Bronze,
    /// [`SILVER_POINTS`] and up.
    Silver,
    /// [`GOLD_POINTS`] and up.
    Gold,
    /// [`DIAMOND_POINTS`] and up.
    Diamond,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bronze => "bronze",
            Self::Silver => "silver",
            Self::Gold => "gold",
            Self::Diamond => "diamond",
        };
        f.write_str(name)
    }
}

/// Tier for a points total.
#[must_use]
pub const fn tier_of(points: u32) -> Tier {
    if points >= DIAMOND_POINTS {
        Tier::Diamond
    } else if points >= GOLD_POINTS {
        Tier::Gold
    } else if points >= SILVER_POINTS {
        Tier::Silver
    } else {
        Tier::Bronze
    }
}

/// A catalog achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    /// Unique identifier.
    pub id: AchievementId,
    /// Display name.
    pub name: String,
    /// Points a single guess must reach.
    pub points_required: u32,
    /// Only guesses on this category count.
    #[serde(default)]
    pub category: Option<CategoryId>,
    /// Only guesses in this country count.
    #[serde(default)]
    pub country: Option<String>,
}

impl Achievement {
    /// Tier of this achievement.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        tier_of(self.points_required)
    }

    /// Whether a scored guess earns this achievement.
    #[must_use]
    pub fn is_met_by(&self, guess: &ScoredGuess<'_>) -> bool {
        guess.points >= self.points_required
            && self.category.is_none_or(|c| c == guess.location.category)
            && self
                .country
                .as_deref()
                .is_none_or(|c| guess.location.country.as_deref() == Some(c))
    }
}

/// A guess as seen by the evaluator.
#[derive(Debug, Clone, Copy)]
pub struct ScoredGuess<'a> {
    /// The location that was played.
    pub location: &'a Location,
    /// Points the guess earned.
    pub points: u32,
}

/// Source of achievement definitions.
pub trait AchievementCatalog: Send + Sync + fmt::Debug {
    /// All defined achievements.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EngineError::DependencyUnavailable`] if the catalog cannot be reached.
    fn list_achievements(&self) -> EngineResult<Vec<Achievement>>;
}

/// Fixed, in-memory achievement list.
#[derive(Debug, Clone, Default)]
pub struct MemoryAchievementCatalog {
    achievements: Vec<Achievement>,
}

impl MemoryAchievementCatalog {
    /// Create a catalog from a list.
    #[must_use]
    pub fn new(achievements: Vec<Achievement>) -> Self {
        Self { achievements }
    }

    /// One global achievement per tier.
    #[must_use]
    pub fn standard() -> Self {
        let tiered = |id, name: &str, points_required| Achievement {
            id,
            name: name.to_string(),
            points_required,
            category: None,
            country: None,
        };
        Self::new(vec![
            tiered(1, "Explorer", 2500),
            tiered(2, "Pathfinder", SILVER_POINTS),
            tiered(3, "Navigator", GOLD_POINTS),
            tiered(4, "Cartographer", DIAMOND_POINTS),
        ])
    }
}

impl AchievementCatalog for MemoryAchievementCatalog {
    fn list_achievements(&self) -> EngineResult<Vec<Achievement>> {
        Ok(self.achievements.clone())
    }
}

/// Achievements in `current` whose id is not in `previous`.
#[must_use]
pub fn newly_earned(previous: &[Achievement], current: &[Achievement]) -> Vec<Achievement> {
    let known: BTreeSet<AchievementId> = previous.iter().map(|a| a.id).collect();
    current
        .iter()
        .filter(|a| !known.contains(&a.id))
        .cloned()
        .collect()
}

/// The achievement to announce: highest `points_required`, lowest id on ties.
#[must_use]
pub fn headline(achievements: &[Achievement]) -> Option<&Achievement> {
    achievements
        .iter()
        .max_by(|a, b| a.points_required.cmp(&b.points_required).then(b.id.cmp(&a.id)))
}

/// What changed for one user after an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AchievementReport {
    /// The evaluated user.
    pub user: UserId,
    /// Everything earned since the last evaluation.
    pub newly_earned: Vec<Achievement>,
    /// The one to present, if any.
    pub headline: Option<Achievement>,
}

/// Evaluates guesses against the catalog and records new achievements.
#[derive(Debug)]
pub struct AchievementEvaluator {
    catalog: Arc<dyn AchievementCatalog>,
    store: Arc<dyn Store>,
}

impl AchievementEvaluator {
    /// Create an evaluator.
    #[must_use]
    pub fn new(catalog: Arc<dyn AchievementCatalog>, store: Arc<dyn Store>) -> Self {
        Self { catalog, store }
    }

    /// Record what `guesses` earn for `user` and report what is new.
    ///
    /// # Errors
    ///
    /// Propagates catalog and storage failures.
    pub fn evaluate(&self, user: UserId, guesses: &[ScoredGuess<'_>]) -> EngineResult<AchievementReport> {
        let all = self.catalog.list_achievements()?;
        let held = self.store.earned_achievements(user)?;

        let previous: Vec<Achievement> = all.iter().filter(|a| held.contains(&a.id)).cloned().collect();
        let current: Vec<Achievement> = all
            .iter()
            .filter(|a| held.contains(&a.id) || guesses.iter().any(|g| a.is_met_by(g)))
            .cloned()
            .collect();

        let newly = newly_earned(&previous, &current);
        if !newly.is_empty() {
            let ids: Vec<AchievementId> = newly.iter().map(|a| a.id).collect();
            self.store.record_achievements(user, &ids)?;
        }

        let headline = headline(&newly).cloned();
        if let Some(top) = &headline {
            info!(
                "user {user} earned {} achievement(s), headline {} ({})",
                newly.len(),
                top.name,
                top.tier()
            );
        }

        Ok(AchievementReport {
            user,
            newly_earned: newly,
            headline,
        })
    }
}
