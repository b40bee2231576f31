//! Wiring of the services around shared collaborators.

use std::sync::Arc;

use crate::achievement::{AchievementCatalog, AchievementEvaluator, MemoryAchievementCatalog};
use crate::catalog::Catalog;
use crate::challenge::ChallengeEngine;
use crate::config::{ConfigError, EngineConfig};
use crate::geo::Scorer;
use crate::identity::{FriendGraph, MemoryFriendGraph};
use crate::sequencer::LocationSequencer;
use crate::session::SessionService;
use crate::store::{MemoryStore, Store};

/// A solo session service and a challenge engine sharing one store,
/// sequencer, scorer and achievement evaluator.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: Arc<dyn Store>,
    sessions: SessionService,
    challenges: ChallengeEngine,
}

impl Engine {
    /// Build an engine over the given collaborators.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn Store>,
        catalog: Arc<dyn Catalog>,
        friends: Arc<dyn FriendGraph>,
        achievements: Arc<dyn AchievementCatalog>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let scorer = Scorer::new(config.scoring);
        let sequencer = Arc::new(LocationSequencer::new(catalog, config.seed));
        let evaluator = Arc::new(AchievementEvaluator::new(achievements, Arc::clone(&store)));

        let sessions = SessionService::new(
            Arc::clone(&store),
            Arc::clone(&sequencer),
            Arc::clone(&evaluator),
            scorer,
            config.session_rounds,
        );
        let challenges = ChallengeEngine::new(Arc::clone(&store), friends, sequencer, evaluator, scorer);

        Ok(Self {
            config,
            store,
            sessions,
            challenges,
        })
    }

    /// An engine over a fresh [`MemoryStore`] and the standard achievements.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `config` fails validation.
    pub fn in_memory(
        config: EngineConfig,
        catalog: Arc<dyn Catalog>,
        friends: Arc<MemoryFriendGraph>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            config,
            Arc::new(MemoryStore::new()),
            catalog,
            friends,
            Arc::new(MemoryAchievementCatalog::standard()),
        )
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Solo sessions.
    #[must_use]
    pub const fn sessions(&self) -> &SessionService {
        &self.sessions
    }

    /// Head-to-head challenges.
    #[must_use]
    pub const fn challenges(&self) -> &ChallengeEngine {
        &self.challenges
    }
}
