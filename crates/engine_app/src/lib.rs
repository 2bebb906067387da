//! # engine_app
//!
//! The [`World`] facade and the fixed-timestep [`TickLoop`] that drives it.
//!
//! A host builds a world, registers its systems in frame order (input, game
//! logic, [`DelaySystem`](engine_system::DelaySystem) and
//! [`QueueSystem`](engine_system::QueueSystem), rendering) and then calls
//! [`World::update`] once per frame, directly or through a [`TickLoop`].

pub mod config;
pub mod tick;
pub mod world;

pub use config::{ConfigError, TickConfig};
pub use tick::TickLoop;
pub use world::World;
