// ── Entity identity ──
//
// The engine never owns entities. It stores ordered lists of `EntityId`
// references and resolves them through the `EntityTable` at read time.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for an entity in a remote collection.
///
/// Remote backends use whatever id scheme they like (`id`, `_id`, synthetic
/// keys); the engine only needs a hashable, ordered string value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Implemented by entity types stored in an [`EntityTable`](crate::EntityTable).
///
/// Replaces the original idea of a runtime-configurable id field name: each
/// entity type states its own key extraction.
pub trait Keyed {
    fn key(&self) -> EntityId;
}

impl<T: Keyed> Keyed for &T {
    fn key(&self) -> EntityId {
        (*self).key()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_round_trips_through_display() {
        let id = EntityId::new("tx-42");
        assert_eq!(id.as_str(), "tx-42");
        assert_eq!(id.to_string(), "tx-42");
    }

    #[test]
    fn entity_id_serializes_transparently() {
        let id = EntityId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        let back: EntityId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(back, id);
    }
}
