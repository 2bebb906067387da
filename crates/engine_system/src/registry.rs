//! System registry: the ordered list of systems run once per frame.
//!
//! Systems run strictly in registration order. That order is the only
//! cross-system ordering the runtime has, so hosts register input first, then
//! simulation and game logic, then timer/queue advancement, then rendering.
//! Later systems see every component change made by earlier ones within the
//! same frame.

use std::any::Any;

use engine_event::TickContext;
use tracing::debug;

use crate::system::System;

/// Object-safe view of a [`System`] that can also be downcast.
trait AnySystem: System {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: System> AnySystem for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A registered system and its active flag.
struct SystemEntry {
    system: Box<dyn AnySystem>,
    active: bool,
}

/// Registry of every system known to the world.
#[derive(Default)]
pub struct SystemRegistry {
    /// Systems in registration order.
    entries: Vec<SystemEntry>,
}

impl std::fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("systems", &self.names())
            .finish()
    }
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a system. It runs after every system registered before it.
    pub fn add<S: System>(&mut self, system: S) {
        debug!(
            system = system.name(),
            position = self.entries.len(),
            "system registered"
        );
        self.entries.push(SystemEntry {
            system: Box::new(system),
            active: true,
        });
    }

    /// Remove the first system registered under `name`.
    ///
    /// Returns `true` if a system was found and removed.
    pub fn remove(&mut self, name: &str) -> bool {
        if let Some(pos) = self.entries.iter().position(|e| e.system.name() == name) {
            self.entries.remove(pos);
            debug!(system = name, "system removed");
            return true;
        }
        false
    }

    /// The first registered system of type `T`.
    #[must_use]
    pub fn get<T: System>(&self) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|e| e.system.as_any().downcast_ref::<T>())
    }

    /// Mutable access to the first registered system of type `T`.
    pub fn get_mut<T: System>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find_map(|e| e.system.as_any_mut().downcast_mut::<T>())
    }

    /// Every registered system of type `T`, in registration order.
    #[must_use]
    pub fn get_all<T: System>(&self) -> Vec<&T> {
        self.entries
            .iter()
            .filter_map(|e| e.system.as_any().downcast_ref::<T>())
            .collect()
    }

    /// Pause or resume every system registered under `name`.
    ///
    /// Returns `true` if at least one system matched.
    pub fn set_active(&mut self, name: &str, active: bool) -> bool {
        let mut found = false;
        for entry in self.entries.iter_mut().filter(|e| e.system.name() == name) {
            entry.active = active;
            found = true;
        }
        found
    }

    /// Whether the first system registered under `name` is active.
    #[must_use]
    pub fn is_active(&self, name: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.system.name() == name)
            .map(|e| e.active)
    }

    /// Pause or resume every system at once.
    pub fn set_all_active(&mut self, active: bool) {
        for entry in &mut self.entries {
            entry.active = active;
        }
        debug!(active, "all systems toggled");
    }

    /// Run one frame: every active system, in registration order.
    pub fn update(&mut self, ctx: &mut TickContext<'_>) {
        for entry in &mut self.entries {
            if entry.active {
                entry.system.update(ctx);
            }
        }
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// System names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.system.name()).collect()
    }

    /// Drop every system.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use engine_component::{Component, ComponentStore, Entity, QueryDescriptor};
    use engine_event::{DelayScheduler, EventBus, EventQueue};

    use super::*;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Appends its name to a shared log every frame.
    struct Recorder {
        name: String,
        log: Log,
        frames: u32,
    }

    impl Recorder {
        fn new(name: &str, log: &Log) -> Self {
            Self {
                name: name.to_string(),
                log: log.clone(),
                frames: 0,
            }
        }
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn update(&mut self, _ctx: &mut TickContext<'_>) {
            self.frames += 1;
            self.log.borrow_mut().push(self.name.clone());
        }
    }

    struct Other;
    impl System for Other {
        fn name(&self) -> &str {
            "other"
        }
    }

    fn frame(registry: &mut SystemRegistry) {
        let mut store = ComponentStore::new();
        let bus = EventBus::new();
        let delays = DelayScheduler::new();
        let queue = EventQueue::new();
        let mut ctx = TickContext::new(1, 0.016, &mut store, &bus, &delays, &queue);
        registry.update(&mut ctx);
    }

    #[test]
    fn test_update_runs_in_registration_order() {
        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(Recorder::new("input", &log));
        registry.add(Recorder::new("logic", &log));
        registry.add(Recorder::new("render", &log));

        frame(&mut registry);
        frame(&mut registry);

        assert_eq!(
            *log.borrow(),
            vec!["input", "logic", "render", "input", "logic", "render"]
        );
        assert_eq!(registry.names(), vec!["input", "logic", "render"]);
    }

    #[test]
    fn test_inactive_systems_are_skipped() {
        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(Recorder::new("input", &log));
        registry.add(Recorder::new("logic", &log));

        assert!(registry.set_active("logic", false));
        assert_eq!(registry.is_active("logic"), Some(false));
        frame(&mut registry);
        assert_eq!(*log.borrow(), vec!["input"]);

        assert!(!registry.set_active("missing", false));
        assert_eq!(registry.is_active("missing"), None);
    }

    #[test]
    fn test_set_all_active_pauses_and_resumes() {
        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(Recorder::new("input", &log));
        registry.add(Recorder::new("logic", &log));

        registry.set_all_active(false);
        frame(&mut registry);
        assert!(log.borrow().is_empty());

        registry.set_all_active(true);
        frame(&mut registry);
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_get_by_type() {
        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(Other);
        registry.add(Recorder::new("a", &log));
        registry.add(Recorder::new("b", &log));

        assert_eq!(registry.get::<Recorder>().map(|r| r.name.as_str()), Some("a"));
        assert!(registry.get::<Other>().is_some());

        let all: Vec<&str> = registry
            .get_all::<Recorder>()
            .into_iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(all, vec!["a", "b"]);

        frame(&mut registry);
        if let Some(recorder) = registry.get_mut::<Recorder>() {
            recorder.frames = 10;
        }
        let frames: Vec<u32> = registry.get_all::<Recorder>().iter().map(|r| r.frames).collect();
        assert_eq!(frames, vec![10, 1]);
    }

    struct Spawned;
    impl Component for Spawned {
        fn type_name() -> &'static str {
            "Spawned"
        }
    }

    struct Health(i32);
    impl Component for Health {
        fn type_name() -> &'static str {
            "Health"
        }
    }

    /// Gives every freshly spawned entity a health pool.
    struct Vitals;
    impl System for Vitals {
        fn name(&self) -> &str {
            "vitals"
        }

        fn query(&self) -> QueryDescriptor {
            QueryDescriptor::new().with::<Spawned>().without::<Health>()
        }

        fn update_entity(&mut self, entity: Entity, ctx: &mut TickContext<'_>) {
            ctx.store.add_component(entity, Health(10));
        }
    }

    /// Records every entity holding health.
    struct HealthBar {
        seen: Vec<Entity>,
    }
    impl System for HealthBar {
        fn name(&self) -> &str {
            "health bar"
        }

        fn query(&self) -> QueryDescriptor {
            QueryDescriptor::new().with::<Health>()
        }

        fn update_entity(&mut self, entity: Entity, _ctx: &mut TickContext<'_>) {
            self.seen.push(entity);
        }
    }

    #[test]
    fn test_later_system_sees_component_added_earlier_in_frame() {
        let mut registry = SystemRegistry::new();
        registry.add(Vitals);
        registry.add(HealthBar { seen: Vec::new() });

        let mut store = ComponentStore::new();
        let goblin = store.create_entity("goblin");
        store.add_component(goblin, Spawned);
        let bus = EventBus::new();
        let delays = DelayScheduler::new();
        let queue = EventQueue::new();

        let mut ctx = TickContext::new(1, 0.016, &mut store, &bus, &delays, &queue);
        registry.update(&mut ctx);
        drop(ctx);

        assert_eq!(registry.get::<HealthBar>().map(|h| h.seen.clone()), Some(vec![goblin]));
        assert_eq!(store.get_component::<Health>(goblin).map(|h| h.0), Some(10));
    }

    #[test]
    fn test_remove_by_name() {
        let log = Log::default();
        let mut registry = SystemRegistry::new();
        registry.add(Recorder::new("input", &log));
        registry.add(Recorder::new("logic", &log));

        assert!(registry.remove("input"));
        assert!(!registry.remove("input"));
        assert_eq!(registry.len(), 1);

        frame(&mut registry);
        assert_eq!(*log.borrow(), vec!["logic"]);

        registry.clear();
        assert!(registry.is_empty());
    }
}
