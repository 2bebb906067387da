//! Core [`Component`] trait, component kind identity and the [`Attached`]
//! wrapper that carries a component's owner back-reference.
//!
//! ## Kind Identity
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! the FNV-1a 64-bit hash algorithm. The id is the key for per-entity storage
//! and for the kind → entity inverse index, so lookups never depend on
//! runtime type introspection.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::entity::Entity;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// Hash a kind name with FNV-1a 64-bit.
///
/// Shared by every type-keyed table in the engine (component kinds here,
/// event kinds on the bus).
///
/// ```text
/// hash = 0xcbf29ce484222325          (offset basis)
/// for each byte in name.as_bytes():
///     hash = hash XOR byte
///     hash = hash * 0x00000100000001b3  (prime)
/// return hash
/// ```
#[must_use]
pub const fn kind_hash(name: &str) -> u64 {
    let bytes = name.as_bytes();
    let mut hash = FNV_OFFSET_BASIS;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
        i += 1;
    }
    hash
}

/// A unique identifier for a component kind, derived from its string name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// Compute the [`ComponentTypeId`] from a component's name.
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(kind_hash(name))
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        T::component_type_id()
    }
}

/// The core component trait.
///
/// Components are plain data owned by exactly one entity. Two component types
/// with the same [`Component::type_name`] share a kind and therefore a storage
/// slot, so names must be unique within a program.
///
/// # Examples
///
/// ```rust
/// use engine_component::Component;
///
/// #[derive(Debug)]
/// struct Health {
///     value: i32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
/// ```
pub trait Component: 'static {
    /// A human-readable name for this component kind.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

/// A component value as stored on an entity.
///
/// The owner is set by the store at the moment the component is attached and
/// cannot be changed afterwards. Dereferences to the component value, so
/// `store.get_component::<Health>(e)?.value` reads straight through.
#[derive(Debug)]
pub struct Attached<T> {
    owner: Entity,
    inner: T,
}

impl<T: Component> Attached<T> {
    pub(crate) fn new(owner: Entity, value: T) -> Self {
        Self { owner, inner: value }
    }

    /// The entity this component is attached to.
    #[must_use]
    pub fn owner(&self) -> Entity {
        self.owner
    }

    /// Detach the wrapper and return the bare value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> Deref for Attached<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for Attached<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Health {
        value: i32,
    }

    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    #[derive(Debug)]
    struct Velocity;

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    #[test]
    fn test_component_type_id_matches_from_name() {
        assert_eq!(Health::component_type_id(), ComponentTypeId::from_name("Health"));
        assert_eq!(ComponentTypeId::of::<Health>(), Health::component_type_id());
    }

    #[test]
    fn test_component_type_id_differs_between_kinds() {
        assert_ne!(Health::component_type_id(), Velocity::component_type_id());
    }

    #[test]
    fn test_fnv1a_known_vectors() {
        // Empty input hashes to the offset basis; "a" is the published FNV-1a test vector.
        assert_eq!(kind_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(kind_hash("a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn test_attached_derefs_to_value() {
        let mut attached = Attached::new(Entity::from_raw(7), Health { value: 10 });
        assert_eq!(attached.owner(), Entity::from_raw(7));
        attached.value -= 3;
        assert_eq!(attached.value, 7);
        assert_eq!(attached.into_inner(), Health { value: 7 });
    }
}
