//! The [`System`] trait.

use engine_component::{Entity, QueryDescriptor};
use engine_event::TickContext;

/// A per-frame unit of work over the entities matching a query.
///
/// Most systems declare a [`query`](System::query) and implement
/// [`update_entity`](System::update_entity); the default
/// [`update`](System::update) re-selects matching entities from the store
/// every frame, so component changes made earlier in the same frame are
/// always picked up. Systems that drive something other than entities
/// (timers, the cooperative queue) override `update` directly.
pub trait System: 'static {
    /// Name used for logs and for registry lookups.
    fn name(&self) -> &str;

    /// The component kinds this system operates on.
    fn query(&self) -> QueryDescriptor {
        QueryDescriptor::new()
    }

    /// Called once per matching entity per frame.
    fn update_entity(&mut self, _entity: Entity, _ctx: &mut TickContext<'_>) {}

    /// Called once per frame while the system is active.
    ///
    /// An entity selected at the start of the frame is skipped if an earlier
    /// `update_entity` call in the same pass destroyed it or made it stop
    /// matching.
    fn update(&mut self, ctx: &mut TickContext<'_>) {
        let query = self.query();
        if query.is_empty() {
            return;
        }
        for entity in ctx.store.select(&query) {
            if ctx.store.matches(entity, &query) {
                self.update_entity(entity, ctx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use engine_component::{Component, ComponentStore};
    use engine_event::{DelayScheduler, EventBus, EventQueue};

    use super::*;

    struct Health(i32);
    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    struct Dead;
    impl Component for Dead {
        fn type_name() -> &'static str {
            "Dead"
        }
    }

    /// Drains one point of health per frame and culls the next entity in line
    /// when it reaches zero.
    #[derive(Default)]
    struct Bleed {
        visited: Vec<Entity>,
    }

    impl System for Bleed {
        fn name(&self) -> &str {
            "bleed"
        }

        fn query(&self) -> QueryDescriptor {
            QueryDescriptor::new().with::<Health>().without::<Dead>()
        }

        fn update_entity(&mut self, entity: Entity, ctx: &mut TickContext<'_>) {
            self.visited.push(entity);
            if let Some(health) = ctx.store.get_component_mut::<Health>(entity) {
                health.0 -= 1;
                if health.0 <= 0 {
                    let next = Entity::from_raw(entity.id() + 1);
                    ctx.store.destroy_entity(next);
                }
            }
        }
    }

    fn run(system: &mut dyn System, store: &mut ComponentStore) {
        let bus = EventBus::new();
        let delays = DelayScheduler::new();
        let queue = EventQueue::new();
        let mut ctx = TickContext::new(1, 0.016, store, &bus, &delays, &queue);
        system.update(&mut ctx);
    }

    #[test]
    fn test_default_update_visits_matching_entities() {
        let mut store = ComponentStore::new();
        let a = store.create_entity("a");
        let b = store.create_entity("b");
        let c = store.create_entity("c");
        store.add_component(a, Health(5));
        store.add_component(b, Health(5));
        store.add_component(b, Dead);
        store.add_component(c, Health(5));

        let mut bleed = Bleed::default();
        run(&mut bleed, &mut store);

        assert_eq!(bleed.visited, vec![a, c]);
        assert_eq!(store.get_component::<Health>(a).map(|h| h.0), Some(4));
        assert_eq!(store.get_component::<Health>(b).map(|h| h.0), Some(5));
    }

    #[test]
    fn test_entity_destroyed_mid_pass_is_skipped() {
        let mut store = ComponentStore::new();
        let a = store.create_entity("a");
        let b = store.create_entity("b");
        store.add_component(a, Health(1));
        store.add_component(b, Health(1));

        let mut bleed = Bleed::default();
        run(&mut bleed, &mut store);

        assert_eq!(bleed.visited, vec![a]);
        assert!(!store.is_alive(b));
    }

    #[test]
    fn test_component_added_between_frames_is_picked_up() {
        let mut store = ComponentStore::new();
        let a = store.create_entity("a");
        let mut bleed = Bleed::default();

        run(&mut bleed, &mut store);
        assert!(bleed.visited.is_empty());

        store.add_component(a, Health(3));
        run(&mut bleed, &mut store);
        assert_eq!(bleed.visited, vec![a]);
    }
}
