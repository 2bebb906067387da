//! The component store: entity table plus the kind → entity inverse index.
//!
//! Every entity owns a type-keyed bag of components. The store keeps, for each
//! component kind, the set of live entities holding it; single-kind and
//! multi-kind queries are answered from that index alone.
//!
//! ## Invariants
//!
//! - An entity holds at most one component per kind.
//! - An entity is listed under kind `K` if and only if it is alive and holds a
//!   `K` component.
//! - Lookups by unknown entity or missing kind return `None`, `false` or an
//!   empty list. Nothing here fails.

use std::any::Any;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::component::{Attached, Component, ComponentTypeId};
use crate::entity::{Entity, EntityAllocator};
use crate::query::QueryDescriptor;
use crate::scene::{ActiveScene, CreatedInScene};

/// One entity's record in the store.
#[derive(Debug)]
struct EntityRecord {
    /// Debug name, not required to be unique.
    name: String,
    /// Cleared just before the record is dropped on destroy.
    active: bool,
    /// Type-erased `Attached<T>` values keyed by kind.
    components: HashMap<ComponentTypeId, Box<dyn Any>>,
}

/// Owns all entities and their components.
///
/// Entities are kept in id order, so every query returns entities in creation
/// order.
#[derive(Debug, Default)]
pub struct ComponentStore {
    allocator: EntityAllocator,
    entities: BTreeMap<Entity, EntityRecord>,
    index: HashMap<ComponentTypeId, BTreeSet<Entity>>,
}

impl ComponentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -- Entity lifecycle --

    /// Allocate a new entity and tag it with the scene active right now.
    ///
    /// With no [`ActiveScene`] holder (during bootstrap, say) the entity is
    /// tagged with no scene.
    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        let entity = self.allocator.allocate();
        let name = name.into();
        let scene = self.current_scene();

        debug!(%entity, name = name.as_str(), ?scene, "entity created");

        self.entities.insert(
            entity,
            EntityRecord {
                name,
                active: true,
                components: HashMap::new(),
            },
        );
        self.attach(entity, CreatedInScene::new(scene));
        entity
    }

    /// Destroy an entity and every component it holds.
    ///
    /// Returns `true` if the entity existed. Destroying an unknown or already
    /// destroyed entity is a no-op.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let Some(mut record) = self.entities.remove(&entity) else {
            return false;
        };
        record.active = false;
        for type_id in record.components.keys() {
            self.unindex(*type_id, entity);
        }
        debug!(%entity, name = record.name.as_str(), "entity destroyed");
        true
    }

    /// Returns `true` if the entity exists and is active.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.get(&entity).is_some_and(|r| r.active)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns all live entities in creation order.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.entities
            .iter()
            .filter(|(_, r)| r.active)
            .map(|(e, _)| *e)
            .collect()
    }

    /// Returns the debug name of an entity.
    #[must_use]
    pub fn name_of(&self, entity: Entity) -> Option<&str> {
        self.entities
            .get(&entity)
            .filter(|r| r.active)
            .map(|r| r.name.as_str())
    }

    /// Find the first live entity with the given name.
    ///
    /// A linear scan meant for diagnostics and one-off setup lookups.
    #[must_use]
    pub fn get_entity_by_name(&self, name: &str) -> Option<Entity> {
        self.entities
            .iter()
            .find(|(_, r)| r.active && r.name == name)
            .map(|(e, _)| *e)
    }

    /// Drop every entity, component and index entry.
    ///
    /// The id allocator is kept, so ids handed out before the reset are never
    /// reissued.
    pub fn clear(&mut self) {
        debug!(entities = self.entities.len(), "store cleared");
        self.entities.clear();
        self.index.clear();
    }

    // -- Component operations --

    /// Attach a component to an entity, replacing any existing component of
    /// the same kind.
    ///
    /// Returns `false` if the entity is unknown, or if the component is the
    /// store-managed [`CreatedInScene`] tag.
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        if T::component_type_id() == CreatedInScene::component_type_id() {
            warn!(%entity, "refusing to attach the scene tag; only the store sets it");
            return false;
        }
        self.attach(entity, component)
    }

    /// Detach the component of kind `T`, returning its value.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let type_id = T::component_type_id();
        if type_id == CreatedInScene::component_type_id() {
            warn!(%entity, "refusing to detach the scene tag");
            return None;
        }
        let record = self.entities.get_mut(&entity).filter(|r| r.active)?;
        let boxed = record.components.remove(&type_id)?;
        self.unindex(type_id, entity);
        boxed
            .downcast::<Attached<T>>()
            .ok()
            .map(|attached| attached.into_inner())
    }

    /// Get a shared reference to an entity's component of kind `T`.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&Attached<T>> {
        self.entities
            .get(&entity)
            .filter(|r| r.active)?
            .components
            .get(&T::component_type_id())?
            .downcast_ref::<Attached<T>>()
    }

    /// Get a mutable reference to an entity's component of kind `T`.
    #[must_use]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut Attached<T>> {
        self.entities
            .get_mut(&entity)
            .filter(|r| r.active)?
            .components
            .get_mut(&T::component_type_id())?
            .downcast_mut::<Attached<T>>()
    }

    /// Returns `true` if the entity is alive and holds a component of kind `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.has_component_id(entity, T::component_type_id())
    }

    /// Returns `true` if the entity is alive and holds a component of the given kind.
    #[must_use]
    pub fn has_component_id(&self, entity: Entity, type_id: ComponentTypeId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|r| r.active && r.components.contains_key(&type_id))
    }

    // -- Query --

    /// All live entities holding a component of kind `T`.
    #[must_use]
    pub fn query<T: Component>(&self) -> Vec<Entity> {
        self.query_id(T::component_type_id())
    }

    /// All live entities holding a component of the given kind.
    #[must_use]
    pub fn query_id(&self, type_id: ComponentTypeId) -> Vec<Entity> {
        self.index
            .get(&type_id)
            .map(|set| set.iter().copied().filter(|e| self.is_alive(*e)).collect())
            .unwrap_or_default()
    }

    /// All live entities holding every one of `kinds`.
    ///
    /// The intersection starts from the smallest index set, so the order of
    /// `kinds` affects only cost, never the result. An empty kind list
    /// matches nothing.
    #[must_use]
    pub fn query_all(&self, kinds: &[ComponentTypeId]) -> Vec<Entity> {
        let mut sets = Vec::with_capacity(kinds.len());
        for type_id in kinds {
            match self.index.get(type_id) {
                Some(set) => sets.push(set),
                None => return Vec::new(),
            }
        }
        sets.sort_by_key(|set| set.len());

        let Some((smallest, rest)) = sets.split_first() else {
            return Vec::new();
        };
        smallest
            .iter()
            .copied()
            .filter(|e| self.is_alive(*e) && rest.iter().all(|set| set.contains(e)))
            .collect()
    }

    /// Answer a [`QueryDescriptor`]: every required kind held, no excluded
    /// kind held.
    #[must_use]
    pub fn select(&self, query: &QueryDescriptor) -> Vec<Entity> {
        if query.is_contradictory() {
            warn!(?query, "query requires and excludes the same kind; matches nothing");
            return Vec::new();
        }
        let mut matched = self.query_all(&query.with);
        if !query.without.is_empty() {
            matched.retain(|e| !query.without.iter().any(|w| self.has_component_id(*e, *w)));
        }
        matched
    }

    /// Whether `entity` is live and satisfies `query` right now.
    #[must_use]
    pub fn matches(&self, entity: Entity, query: &QueryDescriptor) -> bool {
        self.is_alive(entity)
            && query.with.iter().all(|k| self.has_component_id(entity, *k))
            && !query.without.iter().any(|k| self.has_component_id(entity, *k))
    }

    // -- Scenes --

    /// The entity currently holding [`ActiveScene`], if any.
    #[must_use]
    pub fn current_scene(&self) -> Option<Entity> {
        self.query::<ActiveScene>().into_iter().next()
    }

    /// All live entities created while `scene` was active.
    ///
    /// Pass `None` for entities created with no active scene.
    #[must_use]
    pub fn entities_in_scene(&self, scene: Option<Entity>) -> Vec<Entity> {
        self.query::<CreatedInScene>()
            .into_iter()
            .filter(|e| {
                self.get_component::<CreatedInScene>(*e)
                    .is_some_and(|tag| tag.scene() == scene)
            })
            .collect()
    }

    // -- Internals --

    fn attach<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        let type_id = T::component_type_id();
        let Some(record) = self.entities.get_mut(&entity).filter(|r| r.active) else {
            debug!(%entity, component = T::type_name(), "attach to unknown entity ignored");
            return false;
        };
        record
            .components
            .insert(type_id, Box::new(Attached::new(entity, component)));
        self.index.entry(type_id).or_default().insert(entity);
        true
    }

    fn unindex(&mut self, type_id: ComponentTypeId, entity: Entity) {
        if let Some(set) = self.index.get_mut(&type_id) {
            set.remove(&entity);
            if set.is_empty() {
                self.index.remove(&type_id);
            }
        }
    }
}
