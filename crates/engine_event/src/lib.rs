//! # engine_event
//!
//! Everything that moves the simulation forward besides systems themselves:
//!
//! - [`EventBus`]: immediate, type-keyed publish/subscribe.
//! - [`DelayScheduler`]: game-time callbacks, safe to reschedule from a
//!   firing callback.
//! - [`EventQueue`]: two lanes (rules, triggers) of cooperative, suspendable
//!   work items with a single active slot.
//! - [`bridge`]: adapter items that let the queue publish to, or wait on,
//!   the bus.
//! - [`TickContext`]: the per-frame view every callback receives.
//!
//! Everything here is single-threaded. "Suspension" is a state flag checked
//! once per frame, never a blocked thread.

pub mod bridge;
pub mod bus;
pub mod context;
pub mod delay;
pub mod fault;
pub mod queue;

pub use bridge::{FnItem, PublishItem, WaitForEvent, WaitSeconds};
pub use bus::{Event, EventBus, EventTypeId, SubscriptionId, SubscriptionScope};
pub use context::TickContext;
pub use delay::{DelayHandle, DelayScheduler};
pub use fault::Fault;
pub use queue::{EventQueue, ItemContext, ItemState, ItemStatus, Lane, QueueItem};
