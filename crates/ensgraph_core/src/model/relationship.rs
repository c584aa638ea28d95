//! Relationship domain model.
//!
//! # Invariants
//! - `user_id != friend_id`.
//! - At most one row exists per unordered `{user_id, friend_id}` pair.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a relationship row.
pub type RelationshipId = Uuid;

/// Stored relationship between two nodes.
///
/// The `user_id`/`friend_id` orientation is whatever the caller used on insert;
/// it carries no meaning beyond storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipRecord {
    pub id: RelationshipId,
    pub user_id: NodeId,
    pub friend_id: NodeId,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}

impl RelationshipRecord {
    /// Orientation-independent identity of this edge.
    pub fn pair_key(&self) -> PairKey<NodeId> {
        PairKey::new(self.user_id, self.friend_id)
    }
}

/// Unordered pair: `PairKey::new(a, b) == PairKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey<T> {
    low: T,
    high: T,
}

impl<T: Ord> PairKey<T> {
    pub fn new(a: T, b: T) -> Self {
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    pub fn low(&self) -> &T {
        &self.low
    }

    pub fn high(&self) -> &T {
        &self.high
    }

    /// True when both ends are the same value.
    pub fn is_loop(&self) -> bool {
        self.low == self.high
    }
}

impl<T: AsRef<str>> PairKey<T> {
    /// Sorted endpoints joined with `|`.
    pub fn joined(&self) -> String {
        format!("{}|{}", self.low.as_ref(), self.high.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::PairKey;

    #[test]
    fn pair_key_ignores_orientation() {
        assert_eq!(PairKey::new("b.eth", "a.eth"), PairKey::new("a.eth", "b.eth"));
        assert_eq!(PairKey::new("b.eth", "a.eth").joined(), "a.eth|b.eth");
    }

    #[test]
    fn pair_key_detects_loops() {
        assert!(PairKey::new(3, 3).is_loop());
        assert!(!PairKey::new(3, 4).is_loop());
    }
}
