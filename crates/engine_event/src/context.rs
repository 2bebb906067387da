//! The per-frame context handed to systems, bus handlers and delay callbacks.

use engine_component::ComponentStore;

use crate::bus::{Event, EventBus};
use crate::delay::{DelayHandle, DelayScheduler};
use crate::queue::{EventQueue, QueueItem};

/// Borrowed view of the runtime for one frame.
///
/// The store is the only `&mut` resource. The bus, delay scheduler and queue
/// take `&self` everywhere, so a callback may publish, schedule or enqueue
/// while the structure that invoked it is still dispatching.
#[derive(Debug)]
pub struct TickContext<'a> {
    /// Frame counter of the host loop.
    pub tick_id: u64,
    /// Seconds elapsed since the previous frame.
    pub dt: f64,
    pub store: &'a mut ComponentStore,
    pub bus: &'a EventBus,
    pub delays: &'a DelayScheduler,
    pub queue: &'a EventQueue,
}

impl<'a> TickContext<'a> {
    #[must_use]
    pub fn new(
        tick_id: u64,
        dt: f64,
        store: &'a mut ComponentStore,
        bus: &'a EventBus,
        delays: &'a DelayScheduler,
        queue: &'a EventQueue,
    ) -> Self {
        Self {
            tick_id,
            dt,
            store,
            bus,
            delays,
            queue,
        }
    }

    /// Publish an event to every current subscriber.
    pub fn publish<E: Event>(&mut self, event: &E) {
        let bus = self.bus;
        bus.publish(event, self);
    }

    /// Run `callback` after `seconds` of game time.
    pub fn schedule<F>(&self, seconds: f64, callback: F) -> DelayHandle
    where
        F: FnOnce(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.delays.schedule(seconds, callback)
    }

    /// Append an item to the rules lane.
    pub fn enqueue_rule(&self, item: impl QueueItem + 'static) {
        self.queue.enqueue_rule(item);
    }

    /// Append an item to the triggers lane.
    pub fn enqueue_trigger(&self, item: impl QueueItem + 'static) {
        self.queue.enqueue_trigger(item);
    }
}
