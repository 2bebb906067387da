//! Adapter items connecting the cooperative queue to the event bus and to
//! game time.
//!
//! [`PublishItem`] and [`WaitForEvent`] are the only queue items that touch
//! the bus. [`WaitSeconds`] suspends on the delay scheduler and [`FnItem`]
//! runs a one-shot closure step.

use std::cell::Cell;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::debug;

use crate::bus::{Event, SubscriptionId, SubscriptionScope};
use crate::context::TickContext;
use crate::delay::DelayHandle;
use crate::queue::{ItemContext, ItemStatus, QueueItem};

/// Publishes an event when started, then completes immediately.
///
/// Turns "announce that something happened" into a step of a sequence.
pub struct PublishItem<E: Event> {
    name: String,
    status: ItemStatus,
    event: E,
}

impl<E: Event> PublishItem<E> {
    #[must_use]
    pub fn new(event: E) -> Self {
        Self {
            name: format!("publish {}", E::type_name()),
            status: ItemStatus::new(),
            event,
        }
    }

    #[must_use]
    pub fn event(&self) -> &E {
        &self.event
    }
}

impl<E: Event> QueueItem for PublishItem<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &ItemStatus {
        &self.status
    }

    fn start_resolving(&mut self, ctx: &mut ItemContext<'_, '_>) {
        ctx.publish(&self.event);
        self.status.complete();
    }
}

/// Suspends until an event of kind `E` is published.
///
/// Subscribes when started, so events published before the item becomes
/// active are not seen. The payload is ignored. On the first matching event
/// the item completes and drops its subscription; the queue observes the
/// completion on its next tick. Dropping the item (for example through
/// [`EventQueue::clear`](crate::EventQueue::clear)) retires the subscription.
pub struct WaitForEvent<E: Event> {
    name: String,
    status: ItemStatus,
    scope: SubscriptionScope,
    subscription: Rc<Cell<Option<SubscriptionId>>>,
    _event: PhantomData<fn() -> E>,
}

impl<E: Event> WaitForEvent<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: format!("wait for {}", E::type_name()),
            status: ItemStatus::new(),
            scope: SubscriptionScope::new(),
            subscription: Rc::new(Cell::new(None)),
            _event: PhantomData,
        }
    }

    /// Returns `true` while the item holds a bus subscription.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription.get().is_some()
    }
}

impl<E: Event> Default for WaitForEvent<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> QueueItem for WaitForEvent<E> {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &ItemStatus {
        &self.status
    }

    fn start_resolving(&mut self, ctx: &mut ItemContext<'_, '_>) {
        self.status.wait();

        let status = self.status.clone();
        let slot = self.subscription.clone();
        let id = ctx
            .bus()
            .subscribe_scoped(&self.scope, move |_: &E, ctx: &mut TickContext<'_>| {
                let Some(id) = slot.take() else {
                    return Ok(());
                };
                debug!(event = E::type_name(), "awaited event observed");
                status.complete();
                ctx.bus.unsubscribe::<E>(id);
                Ok(())
            });
        self.subscription.set(Some(id));
    }
}

/// Suspends for a fixed span of game time.
///
/// The usual stand-in for "wait for the animation to finish" when the
/// animation's length is known up front.
pub struct WaitSeconds {
    name: String,
    status: ItemStatus,
    seconds: f64,
    handle: Option<DelayHandle>,
}

impl WaitSeconds {
    #[must_use]
    pub fn new(seconds: f64) -> Self {
        Self {
            name: format!("wait {seconds}s"),
            status: ItemStatus::new(),
            seconds,
            handle: None,
        }
    }

    /// The delay backing this wait, once started.
    #[must_use]
    pub fn handle(&self) -> Option<&DelayHandle> {
        self.handle.as_ref()
    }
}

impl QueueItem for WaitSeconds {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &ItemStatus {
        &self.status
    }

    fn start_resolving(&mut self, ctx: &mut ItemContext<'_, '_>) {
        self.status.wait();
        let status = self.status.clone();
        self.handle = Some(ctx.delays().schedule(self.seconds, move |_| {
            status.complete();
            Ok(())
        }));
    }
}

/// A single synchronous step: runs its closure when started and completes.
pub struct FnItem<F> {
    name: String,
    status: ItemStatus,
    step: Option<F>,
}

impl<F> FnItem<F>
where
    F: FnOnce(&mut ItemContext<'_, '_>),
{
    #[must_use]
    pub fn new(name: impl Into<String>, step: F) -> Self {
        Self {
            name: name.into(),
            status: ItemStatus::new(),
            step: Some(step),
        }
    }
}

impl<F> QueueItem for FnItem<F>
where
    F: FnOnce(&mut ItemContext<'_, '_>),
{
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> &ItemStatus {
        &self.status
    }

    fn start_resolving(&mut self, ctx: &mut ItemContext<'_, '_>) {
        if let Some(step) = self.step.take() {
            step(ctx);
        }
        self.status.complete();
    }
}
