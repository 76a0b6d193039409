use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

struct CancelTokenInner {
    cancelled: Cell<bool>,
    abort: RefCell<Option<Box<dyn FnOnce()>>>,
}

/// An opaque abort capability for an in-flight visit.
///
/// The dispatcher creates one per visit and hands it out through
/// `on_cancel_token`. Whoever holds a clone may call [`cancel`](Self::cancel)
/// to request that the visit be interrupted; the dispatcher still owes an
/// `on_cancel`/`on_finish` pair so state can unwind.
///
/// Cancellation is idempotent: the abort closure runs at most once.
#[derive(Clone)]
pub struct CancelToken {
    inner: Rc<CancelTokenInner>,
}

impl CancelToken {
    /// Create a token whose `abort` closure interrupts the visit.
    pub fn new(abort: impl FnOnce() + 'static) -> Self {
        Self {
            inner: Rc::new(CancelTokenInner {
                cancelled: Cell::new(false),
                abort: RefCell::new(Some(Box::new(abort))),
            }),
        }
    }

    /// Request that the visit be aborted. No-op if already cancelled.
    pub fn cancel(&self) {
        if self.inner.cancelled.replace(true) {
            return;
        }
        // take the closure before running it so reentrant cancels see None
        let abort = self.inner.abort.borrow_mut().take();
        if let Some(abort) = abort {
            abort();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.get()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
