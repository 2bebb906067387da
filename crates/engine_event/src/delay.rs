//! Delay scheduler: "run this after N seconds of game time".
//!
//! Entries scheduled at any time land in a staging list. Each
//! [`DelayScheduler::advance`] first moves staging into the live list, then
//! walks the live list back to front: cancelled entries are dropped, the rest
//! accumulate `dt`, and entries whose elapsed time has reached their duration
//! are removed and fired. Elapsed time is compared with a small tolerance so
//! frame steps like `1/60` reach a duration like `0.3` on the expected frame.
//!
//! Callbacks routinely schedule follow-up delays. Those go to staging, not
//! the list being walked, so a chained callback is first visited on the next
//! advance and the walk never sees a list that shifted under it. A
//! [`DelayScheduler::clear`] from inside a callback ends the walk: nothing
//! further fires and the walked entries are discarded.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::context::TickContext;
use crate::fault;

type DelayCallback = Box<dyn FnOnce(&mut TickContext<'_>) -> anyhow::Result<()>>;

/// Slack, in seconds, absorbed when comparing accumulated frame steps with a
/// delay's duration.
const DUE_TOLERANCE: f64 = 1e-9;

/// Handle to a scheduled delay, used to cancel it.
///
/// Cancellation is lazy: the entry is discarded on the next advance that
/// reaches it, without firing.
#[derive(Debug, Clone)]
pub struct DelayHandle {
    id: u64,
    cancelled: Rc<Cell<bool>>,
}

impl DelayHandle {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct DelayEntry {
    id: u64,
    duration: f64,
    elapsed: f64,
    cancelled: Rc<Cell<bool>>,
    callback: DelayCallback,
}

/// Flat list of timed callbacks, advanced once per frame.
#[derive(Default)]
pub struct DelayScheduler {
    next_id: Cell<u64>,
    live: RefCell<Vec<DelayEntry>>,
    staging: RefCell<Vec<DelayEntry>>,
    /// Bumped by `clear`, so an advance in progress knows not to restore.
    generation: Cell<u64>,
    faults: Cell<u64>,
}

impl std::fmt::Debug for DelayScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelayScheduler")
            .field("live", &self.live.borrow().len())
            .field("staging", &self.staging.borrow().len())
            .field("faults", &self.faults.get())
            .finish()
    }
}

impl DelayScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `callback` once `seconds` of game time have been advanced.
    ///
    /// A delay of zero (or less) fires on the next advance.
    pub fn schedule<F>(&self, seconds: f64, callback: F) -> DelayHandle
    where
        F: FnOnce(&mut TickContext<'_>) -> anyhow::Result<()> + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let cancelled = Rc::new(Cell::new(false));

        self.staging.borrow_mut().push(DelayEntry {
            id,
            duration: seconds,
            elapsed: 0.0,
            cancelled: cancelled.clone(),
            callback: Box::new(callback),
        });
        debug!(delay = id, seconds, "delay scheduled");
        DelayHandle { id, cancelled }
    }

    /// Prevent a scheduled delay from firing.
    pub fn cancel(&self, handle: &DelayHandle) {
        handle.cancelled.set(true);
    }

    /// Advance every pending entry by `dt` seconds, firing those that are due.
    pub fn advance(&self, dt: f64, ctx: &mut TickContext<'_>) {
        let generation = self.generation.get();
        let mut live = std::mem::take(&mut *self.live.borrow_mut());
        live.append(&mut *self.staging.borrow_mut());

        let mut i = live.len();
        while i > 0 {
            if self.generation.get() != generation {
                debug!(dropped = live.len(), "delays cleared mid-advance");
                return;
            }
            i -= 1;
            if live[i].cancelled.get() {
                let entry = live.remove(i);
                debug!(delay = entry.id, "cancelled delay dropped");
                continue;
            }
            let entry = &mut live[i];
            entry.elapsed += dt;
            if entry.elapsed + DUE_TOLERANCE < entry.duration {
                continue;
            }

            let entry = live.remove(i);
            debug!(delay = entry.id, "delay fired");
            let callback = entry.callback;
            if let Err(fault) = fault::contain(|| callback(ctx)) {
                self.faults.set(self.faults.get() + 1);
                warn!(delay = entry.id, %fault, "delay callback fault contained");
            }
        }

        if self.generation.get() != generation {
            return;
        }
        let mut slot = self.live.borrow_mut();
        live.append(&mut slot);
        *slot = live;
    }

    /// Number of entries that have not fired and are not cancelled.
    #[must_use]
    pub fn pending(&self) -> usize {
        let live = self.live.borrow();
        let staging = self.staging.borrow();
        live.iter()
            .chain(staging.iter())
            .filter(|e| !e.cancelled.get())
            .count()
    }

    /// Number of callback faults contained since creation.
    #[must_use]
    pub fn fault_count(&self) -> u64 {
        self.faults.get()
    }

    /// Drop every pending entry without firing it.
    ///
    /// Safe to call from a firing callback; entries scheduled after the
    /// clear are kept.
    pub fn clear(&self) {
        self.generation.set(self.generation.get() + 1);
        self.live.borrow_mut().clear();
        self.staging.borrow_mut().clear();
    }
}
