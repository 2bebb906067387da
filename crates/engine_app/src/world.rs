//! The [`World`] facade.
//!
//! The world owns one of each runtime structure: the component store, the
//! system registry, the event bus, the delay scheduler and the cooperative
//! queue. It is the only object the host loop touches. Every frame it builds
//! a [`TickContext`] over its parts and hands it to the registry.

use engine_component::{Attached, Component, ComponentStore, ComponentTypeId, Entity};
use engine_event::{
    DelayHandle, DelayScheduler, Event, EventBus, EventQueue, QueueItem, SubscriptionId,
    TickContext,
};
use engine_system::{System, SystemRegistry};
use tracing::{debug, info};

/// The runtime state of one simulation.
#[derive(Debug, Default)]
pub struct World {
    store: ComponentStore,
    systems: SystemRegistry,
    bus: EventBus,
    delays: DelayScheduler,
    queue: EventQueue,
    /// Frames run so far.
    tick_id: u64,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame: every active system in registration order.
    pub fn update(&mut self, dt: f64) {
        self.tick_id += 1;
        debug!(tick_id = self.tick_id, dt, "frame start");

        let Self {
            store,
            systems,
            bus,
            delays,
            queue,
            tick_id,
        } = self;
        let mut ctx = TickContext::new(*tick_id, dt, store, bus, delays, queue);
        systems.update(&mut ctx);
    }

    /// Frames run so far.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Drop every entity, subscription, pending delay and queued item.
    ///
    /// Registered systems survive, as does the entity id counter.
    pub fn reset(&mut self) {
        self.store.clear();
        self.bus.clear();
        self.delays.clear();
        self.queue.clear();
        info!(tick_id = self.tick_id, "world reset");
    }

    // -- Parts --

    #[must_use]
    pub fn store(&self) -> &ComponentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut self.store
    }

    #[must_use]
    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    pub fn systems_mut(&mut self) -> &mut SystemRegistry {
        &mut self.systems
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn delays(&self) -> &DelayScheduler {
        &self.delays
    }

    #[must_use]
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    // -- Entities and components --

    pub fn create_entity(&mut self, name: impl Into<String>) -> Entity {
        self.store.create_entity(name)
    }

    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        self.store.destroy_entity(entity)
    }

    #[must_use]
    pub fn get_entity_by_name(&self, name: &str) -> Option<Entity> {
        self.store.get_entity_by_name(name)
    }

    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> bool {
        self.store.add_component(entity, component)
    }

    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.store.remove_component::<T>(entity)
    }

    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&Attached<T>> {
        self.store.get_component::<T>(entity)
    }

    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut Attached<T>> {
        self.store.get_component_mut::<T>(entity)
    }

    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.store.has_component::<T>(entity)
    }

    #[must_use]
    pub fn query<T: Component>(&self) -> Vec<Entity> {
        self.store.query::<T>()
    }

    #[must_use]
    pub fn query_all(&self, kinds: &[ComponentTypeId]) -> Vec<Entity> {
        self.store.query_all(kinds)
    }

    // -- Systems --

    /// Register a system to run after every system added before it.
    pub fn add_system<S: System>(&mut self, system: S) {
        self.systems.add(system);
    }

    // -- Events, delays and queue --

    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E, &mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.bus.subscribe(handler)
    }

    pub fn unsubscribe<E: Event>(&self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe::<E>(id)
    }

    /// Publish from outside a frame, e.g. from setup code or host input.
    ///
    /// Handlers see the current `tick_id` and a `dt` of zero.
    pub fn publish<E: Event>(&mut self, event: &E) {
        let Self {
            store,
            bus,
            delays,
            queue,
            tick_id,
            ..
        } = self;
        let mut ctx = TickContext::new(*tick_id, 0.0, store, bus, delays, queue);
        ctx.publish(event);
    }

    pub fn schedule<F>(&self, seconds: f64, callback: F) -> DelayHandle
    where
        F: FnOnce(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.delays.schedule(seconds, callback)
    }

    pub fn cancel(&self, handle: &DelayHandle) {
        self.delays.cancel(handle);
    }

    pub fn enqueue_rule(&self, item: impl QueueItem + 'static) {
        self.queue.enqueue_rule(item);
    }

    pub fn enqueue_trigger(&self, item: impl QueueItem + 'static) {
        self.queue.enqueue_trigger(item);
    }
}
