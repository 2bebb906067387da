//! # engine_system
//!
//! Per-frame systems and the registry that runs them.
//!
//! A [`System`] declares the component kinds it cares about and is handed a
//! [`TickContext`](engine_event::TickContext) once per frame. The
//! [`SystemRegistry`] runs systems strictly in registration order; there is
//! no dependency solver.
//!
//! ```rust
//! use engine_component::{Component, Entity, QueryDescriptor};
//! use engine_event::TickContext;
//! use engine_system::{DelaySystem, QueueSystem, System, SystemRegistry};
//!
//! struct Velocity(f32);
//! impl Component for Velocity {
//!     fn type_name() -> &'static str {
//!         "Velocity"
//!     }
//! }
//!
//! struct Friction;
//! impl System for Friction {
//!     fn name(&self) -> &str {
//!         "friction"
//!     }
//!
//!     fn query(&self) -> QueryDescriptor {
//!         QueryDescriptor::new().with::<Velocity>()
//!     }
//!
//!     fn update_entity(&mut self, entity: Entity, ctx: &mut TickContext<'_>) {
//!         if let Some(v) = ctx.store.get_component_mut::<Velocity>(entity) {
//!             v.0 *= 0.9;
//!         }
//!     }
//! }
//!
//! let mut registry = SystemRegistry::new();
//! registry.add(Friction);
//! registry.add(DelaySystem);
//! registry.add(QueueSystem);
//! assert_eq!(registry.names(), vec!["friction", "delay", "queue"]);
//! ```

pub mod builtin;
pub mod registry;
pub mod system;

pub use builtin::{DelaySystem, QueueSystem};
pub use registry::SystemRegistry;
pub use system::System;
