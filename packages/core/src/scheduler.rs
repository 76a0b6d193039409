use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use slab::Slab;

/// The cancellable one-shot timer seam.
///
/// UI state occasionally needs a deferred transition (a "recently
/// successful" flag that clears itself, say). There is no portable ambient
/// timer in Rust, so the host supplies one: [`ManualScheduler`] for
/// deterministic, headless embeddings, [`TokioScheduler`] (behind the
/// `tokio` feature) where an async runtime drives the UI.
pub trait Scheduler {
    /// Run `callback` once, `after` the given duration, unless the returned
    /// handle is cancelled first.
    fn delay(&self, after: Duration, callback: Box<dyn FnOnce()>) -> DelayHandle;
}

/// Handle to a scheduled callback.
///
/// Cancelling is idempotent, and cancelling after the callback already ran
/// is a no-op.
#[derive(Clone)]
pub struct DelayHandle {
    cancelled: Rc<Cell<bool>>,
}

impl DelayHandle {
    fn new() -> (Self, Rc<Cell<bool>>) {
        let cancelled = Rc::new(Cell::new(false));
        (
            Self {
                cancelled: cancelled.clone(),
            },
            cancelled,
        )
    }

    /// Prevent the callback from running, if it hasn't already.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

struct ScheduledTimer {
    deadline: Duration,
    seq: u64,
    cancelled: Rc<Cell<bool>>,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct ManualSchedulerState {
    now: Duration,
    seq: u64,
    timers: Slab<ScheduledTimer>,
}

/// A [`Scheduler`] with a virtual clock.
///
/// Nothing fires until [`advance`](Self::advance) moves the clock; due
/// callbacks then run in deadline order. Callbacks may schedule further
/// timers, and ones that land inside the advanced window fire during the
/// same call.
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
/// use peregrine_core::{ManualScheduler, Scheduler};
///
/// let scheduler = ManualScheduler::new();
/// let fired = Rc::new(Cell::new(false));
/// let flag = fired.clone();
///
/// scheduler.delay(Duration::from_secs(2), Box::new(move || flag.set(true)));
///
/// scheduler.advance(Duration::from_secs(1));
/// assert!(!fired.get());
/// scheduler.advance(Duration::from_secs(1));
/// assert!(fired.get());
/// ```
#[derive(Default)]
pub struct ManualScheduler {
    state: RefCell<ManualSchedulerState>,
}

impl ManualScheduler {
    /// Create a scheduler at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current virtual time.
    pub fn now(&self) -> Duration {
        self.state.borrow().now
    }

    /// Number of pending, uncancelled timers.
    pub fn pending(&self) -> usize {
        self.state
            .borrow()
            .timers
            .iter()
            .filter(|(_, timer)| !timer.cancelled.get())
            .count()
    }

    /// Move the clock forward, running due callbacks in deadline order.
    pub fn advance(&self, by: Duration) {
        let target = self.state.borrow().now + by;
        loop {
            // pick the earliest due timer, then release the borrow before
            // running it so the callback may reenter the scheduler
            let due = {
                let state = self.state.borrow();
                state
                    .timers
                    .iter()
                    .filter(|(_, timer)| !timer.cancelled.get() && timer.deadline <= target)
                    .min_by_key(|(_, timer)| (timer.deadline, timer.seq))
                    .map(|(key, _)| key)
            };
            let Some(key) = due else { break };
            let timer = {
                let mut state = self.state.borrow_mut();
                let timer = state.timers.remove(key);
                state.now = state.now.max(timer.deadline);
                timer
            };
            (timer.callback)();
        }
        let mut state = self.state.borrow_mut();
        state.now = target;
        state.timers.retain(|_, timer| !timer.cancelled.get());
    }
}

impl Scheduler for ManualScheduler {
    fn delay(&self, after: Duration, callback: Box<dyn FnOnce()>) -> DelayHandle {
        let (handle, cancelled) = DelayHandle::new();
        let mut state = self.state.borrow_mut();
        let deadline = state.now + after;
        let seq = state.seq;
        state.seq += 1;
        state.timers.insert(ScheduledTimer {
            deadline,
            seq,
            cancelled,
            callback,
        });
        tracing::trace!(?after, "timer scheduled");
        handle
    }
}

/// A [`Scheduler`] backed by the tokio timer.
///
/// Callbacks are not `Send`, so delays are spawned onto the current
/// [`LocalSet`](tokio::task::LocalSet); calling
/// [`delay`](Scheduler::delay) outside one panics, as `spawn_local` does.
/// Cancellation is checked when the sleep elapses.
#[cfg(feature = "tokio")]
#[derive(Clone, Copy, Default, Debug)]
pub struct TokioScheduler;

#[cfg(feature = "tokio")]
impl TokioScheduler {
    /// Create a scheduler for the current `LocalSet`.
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "tokio")]
impl Scheduler for TokioScheduler {
    fn delay(&self, after: Duration, callback: Box<dyn FnOnce()>) -> DelayHandle {
        let (handle, cancelled) = DelayHandle::new();
        tokio::task::spawn_local(async move {
            tokio::time::sleep(after).await;
            if !cancelled.get() {
                callback();
            }
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_counts_only_live_timers() {
        let scheduler = ManualScheduler::new();
        let a = scheduler.delay(Duration::from_millis(10), Box::new(|| {}));
        let _b = scheduler.delay(Duration::from_millis(20), Box::new(|| {}));
        assert_eq!(scheduler.pending(), 2);

        a.cancel();
        assert_eq!(scheduler.pending(), 1);
    }

    #[test]
    fn clock_lands_on_the_target() {
        let scheduler = ManualScheduler::new();
        scheduler.advance(Duration::from_millis(1500));
        assert_eq!(scheduler.now(), Duration::from_millis(1500));
    }
}
