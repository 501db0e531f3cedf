//! Entity identifiers shared by every subsystem.

use serde::{Deserialize, Serialize};

/// Opaque correlation key for a logical entity.
///
/// The messaging core never interprets the number; it only forwards it
/// between the subsystem that publishes and the one that owns the entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub i64);

impl EntityId {
    /// Create an entity ID from a raw integer.
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw integer behind this ID.
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
