//! Entity handles.
//!
//! The store hands out entity ids from a counter that only moves forward.
//! Destroying an entity retires its id for good, so a handle kept by a
//! handler, delay or queue item after the entity is gone simply misses on
//! lookup; it can never start pointing at a newer entity.

use serde::{Deserialize, Serialize};

/// Handle to an entity in a [`ComponentStore`](crate::ComponentStore).
///
/// Serialises as the bare id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Forward-only id counter owned by a store. The first id is 1.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    last: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The next unused id. Survives [`ComponentStore::clear`](crate::ComponentStore::clear).
    pub fn allocate(&mut self) -> Entity {
        self.last += 1;
        Entity(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one_and_only_grow() {
        let mut ids = EntityAllocator::new();
        let first = ids.allocate();
        let second = ids.allocate();
        assert_eq!(first, Entity::from_raw(1));
        assert_eq!(second.id(), 2);
        assert!(second > first);
    }

    #[test]
    fn test_display_and_serialised_form() {
        let goblin = Entity::from_raw(12);
        assert_eq!(goblin.to_string(), "#12");
        assert_eq!(serde_json::to_string(&goblin).unwrap(), "12");
        let back: Entity = serde_json::from_str("12").unwrap();
        assert_eq!(back, goblin);
    }
}
