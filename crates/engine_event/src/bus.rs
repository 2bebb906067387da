//! Type-keyed publish/subscribe for one-shot notifications.
//!
//! Handlers run synchronously inside [`EventBus::publish`], in subscription
//! order. Each publish dispatches over a snapshot of the handler list taken
//! before the first handler runs: subscribing or unsubscribing from inside a
//! handler affects the next publish, never the one in progress.
//!
//! A handler that errors or panics is logged and skipped; the remaining
//! handlers still run. Handlers take `&self`-style closures (`Fn`), so a
//! handler that publishes the kind it is handling runs again for the nested
//! event; keep mutable handler state in a `Cell` or `RefCell`.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use engine_component::kind_hash;

use crate::context::TickContext;
use crate::fault;

/// An event payload type.
///
/// ```rust
/// use engine_event::Event;
///
/// struct DamageEvent {
///     amount: i32,
/// }
///
/// impl Event for DamageEvent {
///     fn type_name() -> &'static str { "DamageEvent" }
/// }
/// ```
pub trait Event: 'static {
    /// A human-readable name for this event kind.
    fn type_name() -> &'static str;

    /// Returns the [`EventTypeId`] for this event kind.
    fn event_type_id() -> EventTypeId {
        EventTypeId::from_name(Self::type_name())
    }
}

/// Identifier of an event kind: the FNV-1a hash of its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventTypeId(pub u64);

impl EventTypeId {
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        Self(kind_hash(name))
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Lifetime token for subscriptions made with [`EventBus::subscribe_scoped`].
///
/// When the last clone is dropped, every subscription tied to it stops
/// receiving events and no longer counts as a subscriber.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionScope(Rc<()>);

impl SubscriptionScope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

type ErasedHandler = dyn Fn(&dyn Any, &mut TickContext<'_>) -> anyhow::Result<()>;

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    handler: Rc<ErasedHandler>,
    scope: Option<Weak<()>>,
}

impl Subscription {
    fn is_live(&self) -> bool {
        self.scope.as_ref().is_none_or(|scope| scope.strong_count() > 0)
    }
}

/// Global, type-keyed publish/subscribe.
///
/// Owned by the world rather than held in a process-wide static, so tests
/// can build isolated buses.
#[derive(Default)]
pub struct EventBus {
    next_id: Cell<u64>,
    subscriptions: RefCell<HashMap<EventTypeId, Vec<Subscription>>>,
    faults: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let subscriptions = self.subscriptions.borrow();
        f.debug_struct("EventBus")
            .field("event_kinds", &subscriptions.len())
            .field(
                "handlers",
                &subscriptions
                    .values()
                    .flatten()
                    .filter(|s| s.is_live())
                    .count(),
            )
            .field("faults", &self.faults.get())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no subscriptions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for events of kind `E`.
    ///
    /// Handlers run in subscription order.
    pub fn subscribe<E, F>(&self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E, &mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.insert::<E>(erase(handler), None)
    }

    /// Register a handler that lives only as long as `scope`.
    ///
    /// Once every clone of `scope` is dropped the handler is never invoked
    /// again and is pruned on the next (un)subscribe or publish of `E`.
    pub fn subscribe_scoped<E, F>(&self, scope: &SubscriptionScope, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&E, &mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    {
        self.insert::<E>(erase(handler), Some(Rc::downgrade(&scope.0)))
    }

    fn insert<E: Event>(&self, handler: Rc<ErasedHandler>, scope: Option<Weak<()>>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let mut subscriptions = self.subscriptions.borrow_mut();
        let list = subscriptions.entry(E::event_type_id()).or_default();
        list.retain(Subscription::is_live);
        list.push(Subscription { id, handler, scope });
        trace!(event = E::type_name(), subscription = id.0, "subscribed");
        id
    }

    /// Remove a handler registered for kind `E`.
    ///
    /// Returns `false` if no such subscription exists.
    pub fn unsubscribe<E: Event>(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let Some(list) = subscriptions.get_mut(&E::event_type_id()) else {
            return false;
        };
        let removed = list.iter().any(|s| s.id == id && s.is_live());
        list.retain(|s| s.id != id && s.is_live());
        if list.is_empty() {
            subscriptions.remove(&E::event_type_id());
        }
        if removed {
            trace!(event = E::type_name(), subscription = id.0, "unsubscribed");
        }
        removed
    }

    /// Deliver `event` to every handler subscribed to `E` at the moment of
    /// the call.
    ///
    /// A nested publish from inside a handler is dispatched in full before
    /// the outer publish moves on to its next handler.
    pub fn publish<E: Event>(&self, event: &E, ctx: &mut TickContext<'_>) {
        let snapshot: Vec<Subscription> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            match subscriptions.get_mut(&E::event_type_id()) {
                Some(list) => {
                    list.retain(Subscription::is_live);
                    list.clone()
                }
                None => Vec::new(),
            }
        };

        trace!(event = E::type_name(), handlers = snapshot.len(), "publish");

        for subscription in snapshot {
            if !subscription.is_live() {
                continue;
            }
            let handler: &ErasedHandler = &*subscription.handler;
            let payload: &dyn Any = event;
            if let Err(fault) = fault::contain(|| handler(payload, ctx)) {
                self.faults.set(self.faults.get() + 1);
                warn!(
                    event = E::type_name(),
                    subscription = subscription.id.0,
                    %fault,
                    "event handler fault contained"
                );
            }
        }
    }

    /// Number of handlers currently subscribed to `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscriptions
            .borrow()
            .get(&E::event_type_id())
            .map_or(0, |list| list.iter().filter(|s| s.is_live()).count())
    }

    /// Number of handler faults contained since the bus was created.
    #[must_use]
    pub fn fault_count(&self) -> u64 {
        self.faults.get()
    }

    /// Drop every subscription.
    pub fn clear(&self) {
        self.subscriptions.borrow_mut().clear();
    }
}

fn erase<E, F>(handler: F) -> Rc<ErasedHandler>
where
    E: Event,
    F: Fn(&E, &mut TickContext<'_>) -> anyhow::Result<()> + 'static,
{
    let erased = untyped(move |payload, ctx| match payload.downcast_ref::<E>() {
        Some(event) => handler(event, ctx),
        None => Err(anyhow::anyhow!(
            "payload delivered under the wrong kind, expected {}",
            E::type_name()
        )),
    });
    Rc::new(erased)
}

/// Pins a closure to the erased handler signature.
fn untyped<F>(f: F) -> F
where
    F: Fn(&dyn Any, &mut TickContext<'_>) -> anyhow::Result<()>,
{
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Fixture;

    struct Damage {
        amount: i32,
    }
    impl Event for Damage {
        fn type_name() -> &'static str {
            "Damage"
        }
    }

    struct Heal;
    impl Event for Heal {
        fn type_name() -> &'static str {
            "Heal"
        }
    }

    #[test]
    fn test_event_type_id_from_name() {
        assert_eq!(Damage::event_type_id(), EventTypeId::from_name("Damage"));
        assert_ne!(Damage::event_type_id(), Heal::event_type_id());
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let mut fx = Fixture::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let log = log.clone();
            fx.bus.subscribe(move |e: &Damage, _ctx| {
                log.borrow_mut().push((tag, e.amount));
                Ok(())
            });
        }

        fx.publish(&Damage { amount: 3 });
        assert_eq!(
            *log.borrow(),
            vec![("first", 3), ("second", 3), ("third", 3)]
        );
    }

    #[test]
    fn test_faulting_handler_does_not_stop_dispatch() {
        let mut fx = Fixture::new();
        let hits = Rc::new(Cell::new(0));

        let h = hits.clone();
        fx.bus.subscribe(move |_: &Damage, _ctx| {
            h.set(h.get() + 1);
            Ok(())
        });
        fx.bus
            .subscribe(|_: &Damage, _ctx| Err(anyhow::anyhow!("handler failed")));
        fx.bus.subscribe(|_: &Damage, _ctx| panic!("handler panicked"));
        let h = hits.clone();
        fx.bus.subscribe(move |_: &Damage, _ctx| {
            h.set(h.get() + 1);
            Ok(())
        });

        fx.publish(&Damage { amount: 1 });
        assert_eq!(hits.get(), 2);
        assert_eq!(fx.bus.fault_count(), 2);
    }

    #[test]
    fn test_subscribe_during_dispatch_waits_for_next_publish() {
        let mut fx = Fixture::new();
        let late_hits = Rc::new(Cell::new(0));

        let late = late_hits.clone();
        let added = Rc::new(Cell::new(false));
        fx.bus.subscribe(move |_: &Damage, ctx| {
            if !added.get() {
                added.set(true);
                let late = late.clone();
                ctx.bus.subscribe(move |_: &Damage, _ctx| {
                    late.set(late.get() + 1);
                    Ok(())
                });
            }
            Ok(())
        });

        fx.publish(&Damage { amount: 1 });
        assert_eq!(late_hits.get(), 0);
        assert_eq!(fx.bus.subscriber_count::<Damage>(), 2);

        fx.publish(&Damage { amount: 1 });
        assert_eq!(late_hits.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_still_runs_snapshot() {
        let mut fx = Fixture::new();
        let second_hits = Rc::new(Cell::new(0));
        let second_id = Rc::new(Cell::new(None));

        let target = second_id.clone();
        fx.bus.subscribe(move |_: &Damage, ctx| {
            if let Some(id) = target.take() {
                ctx.bus.unsubscribe::<Damage>(id);
            }
            Ok(())
        });
        let hits = second_hits.clone();
        let id = fx.bus.subscribe(move |_: &Damage, _ctx| {
            hits.set(hits.get() + 1);
            Ok(())
        });
        second_id.set(Some(id));

        fx.publish(&Damage { amount: 1 });
        assert_eq!(second_hits.get(), 1, "snapshot still includes the removed handler");

        fx.publish(&Damage { amount: 1 });
        assert_eq!(second_hits.get(), 1);
        assert_eq!(fx.bus.subscriber_count::<Damage>(), 1);
    }

    #[test]
    fn test_handlers_only_see_their_kind() {
        let mut fx = Fixture::new();
        let heals = Rc::new(Cell::new(0));
        let h = heals.clone();
        fx.bus.subscribe(move |_: &Heal, _ctx| {
            h.set(h.get() + 1);
            Ok(())
        });

        fx.publish(&Damage { amount: 5 });
        assert_eq!(heals.get(), 0);
        fx.publish(&Heal);
        assert_eq!(heals.get(), 1);
    }

    #[test]
    fn test_nested_publish_of_same_kind_reaches_every_handler() {
        let mut fx = Fixture::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = log.clone();
        fx.bus.subscribe(move |e: &Damage, ctx| {
            l.borrow_mut().push(("chain", e.amount));
            if e.amount == 1 {
                ctx.publish(&Damage { amount: 2 });
            }
            Ok(())
        });
        let l = log.clone();
        fx.bus.subscribe(move |e: &Damage, _ctx| {
            l.borrow_mut().push(("logger", e.amount));
            Ok(())
        });

        fx.publish(&Damage { amount: 1 });
        assert_eq!(
            *log.borrow(),
            vec![("chain", 1), ("chain", 2), ("logger", 2), ("logger", 1)]
        );
        assert_eq!(fx.bus.fault_count(), 0);
    }

    #[test]
    fn test_scoped_subscription_ends_with_its_scope() {
        let mut fx = Fixture::new();
        let hits = Rc::new(Cell::new(0));
        let scope = SubscriptionScope::new();

        let h = hits.clone();
        let id = fx.bus.subscribe_scoped(&scope, move |_: &Damage, _ctx| {
            h.set(h.get() + 1);
            Ok(())
        });
        fx.publish(&Damage { amount: 1 });
        assert_eq!(hits.get(), 1);
        assert_eq!(fx.bus.subscriber_count::<Damage>(), 1);

        drop(scope);
        assert_eq!(fx.bus.subscriber_count::<Damage>(), 0);
        fx.publish(&Damage { amount: 1 });
        assert_eq!(hits.get(), 1);
        assert!(!fx.bus.unsubscribe::<Damage>(id));
    }

    #[test]
    fn test_scope_dropped_mid_dispatch_skips_the_handler() {
        let mut fx = Fixture::new();
        let hits = Rc::new(Cell::new(0));
        let scope = Rc::new(RefCell::new(Some(SubscriptionScope::new())));

        let holder = scope.clone();
        fx.bus.subscribe(move |_: &Damage, _ctx| {
            holder.borrow_mut().take();
            Ok(())
        });
        let h = hits.clone();
        if let Some(scope) = scope.borrow().as_ref() {
            fx.bus.subscribe_scoped(scope, move |_: &Damage, _ctx| {
                h.set(h.get() + 1);
                Ok(())
            });
        }

        fx.publish(&Damage { amount: 1 });
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_unsubscribe_unknown_and_clear() {
        let mut fx = Fixture::new();
        let id = fx.bus.subscribe(|_: &Damage, _ctx| Ok(()));
        assert!(!fx.bus.unsubscribe::<Heal>(id));
        assert!(fx.bus.unsubscribe::<Damage>(id));
        assert!(!fx.bus.unsubscribe::<Damage>(id));

        fx.bus.subscribe(|_: &Damage, _ctx| Ok(()));
        fx.bus.clear();
        assert_eq!(fx.bus.subscriber_count::<Damage>(), 0);
        fx.publish(&Damage { amount: 1 });
    }

    #[test]
    fn test_handler_can_mutate_components() {
        use engine_component::Component;

        struct Health {
            value: i32,
        }
        impl Component for Health {
            fn type_name() -> &'static str {
                "Health"
            }
        }

        let mut fx = Fixture::new();
        let hero = fx.store.create_entity("Hero");
        fx.store.add_component(hero, Health { value: 10 });
        fx.bus.subscribe(move |e: &Damage, ctx| {
            if let Some(health) = ctx.store.get_component_mut::<Health>(hero) {
                health.value -= e.amount;
            }
            Ok(())
        });

        fx.publish(&Damage { amount: 3 });
        assert_eq!(fx.store.get_component::<Health>(hero).unwrap().value, 7);
    }
}
