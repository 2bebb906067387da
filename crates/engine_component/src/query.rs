//! Query descriptors for system entity selection.
//!
//! A [`QueryDescriptor`] declares which component kinds an entity must hold
//! (and which it must not) to be processed by a system. Descriptors are
//! answered by [`ComponentStore::select`](crate::ComponentStore::select)
//! through the kind → entity index, re-evaluated every frame.

use crate::component::{Component, ComponentTypeId};

/// Describes the entities a system wants to process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    /// Kinds the entity must hold, all of them.
    pub with: Vec<ComponentTypeId>,
    /// Kinds the entity must not hold, any of them.
    pub without: Vec<ComponentTypeId>,
}

impl QueryDescriptor {
    /// Create a new empty query descriptor. An empty descriptor matches
    /// nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require component kind `T`.
    #[must_use]
    pub fn with<T: Component>(self) -> Self {
        self.with_id(T::component_type_id())
    }

    /// Require a component kind by id.
    #[must_use]
    pub fn with_id(mut self, type_id: ComponentTypeId) -> Self {
        if !self.with.contains(&type_id) {
            self.with.push(type_id);
        }
        self
    }

    /// Exclude entities holding component kind `T`.
    #[must_use]
    pub fn without<T: Component>(self) -> Self {
        self.without_id(T::component_type_id())
    }

    /// Exclude entities holding a component kind by id.
    #[must_use]
    pub fn without_id(mut self, type_id: ComponentTypeId) -> Self {
        if !self.without.contains(&type_id) {
            self.without.push(type_id);
        }
        self
    }

    /// Returns `true` if the descriptor requires nothing, and so can never
    /// match through the index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with.is_empty()
    }

    /// Returns `true` if a kind is both required and excluded, making the
    /// descriptor unsatisfiable.
    #[must_use]
    pub fn is_contradictory(&self) -> bool {
        self.with.iter().any(|w| self.without.contains(w))
    }
}
