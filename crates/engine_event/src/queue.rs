//! Cooperative two-lane event queue.
//!
//! Multi-step gameplay actions are sequenced as [`QueueItem`]s. Exactly one
//! item is active at a time and the queue advances once per frame:
//!
//! ```text
//!   Pending ──pop──▶ Resolving ──▶ Waiting ──(external signal)──▶ Complete
//!                        │                                           ▲
//!                        └───────────────────────────────────────────┘
//! ```
//!
//! - With no active item, a tick pops the next item, rules lane first,
//!   marks it `Resolving` and calls [`QueueItem::start_resolving`] once.
//! - With an active item, a tick calls [`QueueItem::update`], whichever of
//!   `Resolving` or `Waiting` it reports.
//! - An item observed `Complete` is dropped and the slot is free for the next
//!   tick.
//!
//! "Suspending" means reporting `Waiting` and doing nothing in `update` until
//! something else (a bus handler, a system, a delay callback) flips the
//! item's [`ItemStatus`] to `Complete`. The queue cannot tell a slow item from
//! a stuck one; an item that never completes blocks the queue for good.
//!
//! Triggers never preempt rules: the triggers lane is only popped while the
//! rules lane is empty.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use engine_component::ComponentStore;

use crate::bus::{Event, EventBus};
use crate::context::TickContext;
use crate::delay::DelayScheduler;

/// Lifecycle state of a queue item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemState {
    #[default]
    Pending,
    Resolving,
    Waiting,
    Complete,
}

impl ItemState {
    /// `Resolving` or `Waiting`.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Resolving | Self::Waiting)
    }
}

/// Shared, clonable handle to an item's state.
///
/// Items hold one and hand clones to whatever external code will later
/// resume them.
#[derive(Debug, Clone, Default)]
pub struct ItemStatus(Rc<Cell<ItemState>>);

impl ItemStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self) -> ItemState {
        self.0.get()
    }

    pub fn set(&self, state: ItemState) {
        self.0.set(state);
    }

    /// Suspend: report `Waiting` until something completes the item.
    pub fn wait(&self) {
        self.set(ItemState::Waiting);
    }

    pub fn complete(&self) {
        self.set(ItemState::Complete);
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.get() == ItemState::Complete
    }
}

/// One lane of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lane {
    /// Deterministic, engine-driven resolution steps.
    Rules,
    /// Reactive follow-ups; run only once the rules lane is empty.
    Triggers,
}

/// A unit of cooperative work.
///
/// Implementors carry their own payload and an [`ItemStatus`].
pub trait QueueItem {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// The item's state handle.
    fn status(&self) -> &ItemStatus;

    /// Called once when the item is popped, with the state already set to
    /// `Resolving`. May move the state on (to `Waiting`, or straight to
    /// `Complete`).
    fn start_resolving(&mut self, ctx: &mut ItemContext<'_, '_>);

    /// Called every later tick while the item is active.
    fn update(&mut self, _dt: f64, _ctx: &mut ItemContext<'_, '_>) {}
}

/// What a queue item may touch while it runs.
///
/// Items get the store, the delay scheduler and the queue itself. The event
/// bus is reachable only from the bridge items in
/// [`bridge`](crate::bridge), which keeps every queue/bus interaction in one
/// place.
#[derive(Debug)]
pub struct ItemContext<'c, 'a> {
    inner: &'c mut TickContext<'a>,
}

impl<'c, 'a> ItemContext<'c, 'a> {
    fn new(inner: &'c mut TickContext<'a>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.inner.tick_id
    }

    #[must_use]
    pub fn dt(&self) -> f64 {
        self.inner.dt
    }

    #[must_use]
    pub fn store(&self) -> &ComponentStore {
        &*self.inner.store
    }

    pub fn store_mut(&mut self) -> &mut ComponentStore {
        &mut *self.inner.store
    }

    #[must_use]
    pub fn delays(&self) -> &'a DelayScheduler {
        self.inner.delays
    }

    #[must_use]
    pub fn queue(&self) -> &'a EventQueue {
        self.inner.queue
    }

    pub(crate) fn bus(&self) -> &'a EventBus {
        self.inner.bus
    }

    pub(crate) fn publish<E: Event>(&mut self, event: &E) {
        self.inner.publish(event);
    }
}

struct ActiveItem {
    lane: Lane,
    item: Box<dyn QueueItem>,
}

/// Two ordered lanes of queue items with a single active slot.
#[derive(Default)]
pub struct EventQueue {
    rules: RefCell<VecDeque<Box<dyn QueueItem>>>,
    triggers: RefCell<VecDeque<Box<dyn QueueItem>>>,
    active: RefCell<Option<ActiveItem>>,
    ticking: Cell<bool>,
    /// Bumped by `clear`, so a tick in progress drops its item instead of
    /// restoring it.
    generation: Cell<u64>,
    /// Name and status of the item held by an in-progress tick.
    in_flight: RefCell<Option<(String, ItemStatus)>>,
}

impl std::fmt::Debug for EventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventQueue")
            .field("rules", &self.pending_rules())
            .field("triggers", &self.pending_triggers())
            .field("active", &self.active_name())
            .finish()
    }
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an item to the rules lane.
    pub fn enqueue_rule(&self, item: impl QueueItem + 'static) {
        self.enqueue(Lane::Rules, Box::new(item));
    }

    /// Append an item to the triggers lane.
    pub fn enqueue_trigger(&self, item: impl QueueItem + 'static) {
        self.enqueue(Lane::Triggers, Box::new(item));
    }

    /// Append a boxed item to `lane`. The item is reset to `Pending`.
    pub fn enqueue(&self, lane: Lane, item: Box<dyn QueueItem>) {
        item.status().set(ItemState::Pending);
        debug!(item = item.name(), ?lane, "queue item enqueued");
        match lane {
            Lane::Rules => self.rules.borrow_mut().push_back(item),
            Lane::Triggers => self.triggers.borrow_mut().push_back(item),
        }
    }

    /// Advance the queue by one frame.
    pub fn tick(&self, dt: f64, ctx: &mut TickContext<'_>) {
        if self.ticking.get() {
            warn!("queue tick re-entered from inside a queue item; ignored");
            return;
        }
        self.ticking.set(true);
        let generation = self.generation.get();

        let taken = self.active.borrow_mut().take();
        let current = match taken {
            Some(mut current) => {
                if !current.item.status().is_complete() {
                    self.mark_in_flight(&current);
                    current.item.update(dt, &mut ItemContext::new(ctx));
                }
                current
            }
            None => match self.pop_next() {
                Some(mut next) => {
                    debug!(item = next.item.name(), lane = ?next.lane, "queue item resolving");
                    next.item.status().set(ItemState::Resolving);
                    self.mark_in_flight(&next);
                    next.item.start_resolving(&mut ItemContext::new(ctx));
                    next
                }
                None => {
                    self.ticking.set(false);
                    return;
                }
            },
        };

        *self.in_flight.borrow_mut() = None;
        if self.generation.get() != generation {
            debug!(item = current.item.name(), "queue cleared while item was running");
        } else if current.item.status().is_complete() {
            debug!(item = current.item.name(), lane = ?current.lane, "queue item complete");
        } else {
            if current.item.status().get() == ItemState::Pending {
                current.item.status().set(ItemState::Resolving);
            }
            *self.active.borrow_mut() = Some(current);
        }
        self.ticking.set(false);
    }

    /// `true` when no item is active and both lanes are empty.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.active_name().is_none()
            && self.rules.borrow().is_empty()
            && self.triggers.borrow().is_empty()
    }

    /// Name of the active item.
    #[must_use]
    pub fn active_name(&self) -> Option<String> {
        if let Some((name, _)) = self.in_flight.borrow().as_ref() {
            return Some(name.clone());
        }
        self.active
            .borrow()
            .as_ref()
            .map(|a| a.item.name().to_string())
    }

    /// State of the active item.
    #[must_use]
    pub fn active_state(&self) -> Option<ItemState> {
        if let Some((_, status)) = self.in_flight.borrow().as_ref() {
            return Some(status.get());
        }
        self.active.borrow().as_ref().map(|a| a.item.status().get())
    }

    #[must_use]
    pub fn pending_rules(&self) -> usize {
        self.rules.borrow().len()
    }

    #[must_use]
    pub fn pending_triggers(&self) -> usize {
        self.triggers.borrow().len()
    }

    /// Drop every queued and active item.
    ///
    /// Called from inside the active item, that item is dropped when it
    /// returns; items enqueued after the clear are kept.
    pub fn clear(&self) {
        self.generation.set(self.generation.get() + 1);
        self.rules.borrow_mut().clear();
        self.triggers.borrow_mut().clear();
        self.active.borrow_mut().take();
    }

    fn pop_next(&self) -> Option<ActiveItem> {
        if let Some(item) = self.rules.borrow_mut().pop_front() {
            return Some(ActiveItem {
                lane: Lane::Rules,
                item,
            });
        }
        self.triggers
            .borrow_mut()
            .pop_front()
            .map(|item| ActiveItem {
                lane: Lane::Triggers,
                item,
            })
    }

    fn mark_in_flight(&self, current: &ActiveItem) {
        *self.in_flight.borrow_mut() =
            Some((current.item.name().to_string(), current.item.status().clone()));
    }
}
