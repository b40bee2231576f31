//! User identity and the friend graph.
//!
//! Authentication happens outside the engine. Every operation receives the
//! already-authenticated caller as an explicit [`UserId`].

use std::collections::HashSet;
use std::fmt;
use std::sync::RwLock;

use crate::error::{EngineError, EngineResult};

/// Unique identifier for a user.
pub type UserId = u64;

/// Friendship lookups.
pub trait FriendGraph: Send + Sync + fmt::Debug {
    /// Whether `a` and `b` are connected. Symmetric.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DependencyUnavailable`] if the lookup fails.
    fn are_friends(&self, a: UserId, b: UserId) -> EngineResult<bool>;
}

/// In-memory, undirected friend graph.
#[derive(Debug, Default)]
pub struct MemoryFriendGraph {
    edges: RwLock<HashSet<(UserId, UserId)>>,
}

/// Order a pair so the edge set is undirected.
const fn edge(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl MemoryFriendGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect two users.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DependencyUnavailable`] if the graph lock is poisoned.
    pub fn befriend(&self, a: UserId, b: UserId) -> EngineResult<()> {
        self.edges
            .write()
            .map_err(|e| EngineError::unavailable("friend graph", e))?
            .insert(edge(a, b));
        Ok(())
    }

    /// Disconnect two users.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DependencyUnavailable`] if the graph lock is poisoned.
    pub fn unfriend(&self, a: UserId, b: UserId) -> EngineResult<()> {
        self.edges
            .write()
            .map_err(|e| EngineError::unavailable("friend graph", e))?
            .remove(&edge(a, b));
        Ok(())
    }
}

impl FriendGraph for MemoryFriendGraph {
    fn are_friends(&self, a: UserId, b: UserId) -> EngineResult<bool> {
        Ok(self
            .edges
            .read()
            .map_err(|e| EngineError::unavailable("friend graph", e))?
            .contains(&edge(a, b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friendship_is_symmetric() {
        let graph = MemoryFriendGraph::new();
        graph.befriend(2, 1).unwrap();
        assert!(graph.are_friends(1, 2).unwrap());
        assert!(graph.are_friends(2, 1).unwrap());
        assert!(!graph.are_friends(1, 3).unwrap());
    }

    #[test]
    fn test_unfriend() {
        let graph = MemoryFriendGraph::new();
        graph.befriend(1, 2).unwrap();
        graph.unfriend(2, 1).unwrap();
        assert!(!graph.are_friends(1, 2).unwrap());
    }
}
