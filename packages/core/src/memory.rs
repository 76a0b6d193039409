use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;

use crate::{CancelToken, Dispatcher, Errors, Method, Page, Progress, Visit, VisitOptions};

struct InFlight {
    id: u64,
    visit: Visit,
    options: VisitOptions,
    token: CancelToken,
}

/// A [`Dispatcher`] that performs no I/O and parks visits in memory.
///
/// Submitting runs the front half of the lifecycle (`before`, cancel token
/// delivery, `start`) synchronously, then parks the visit until the embedder
/// resolves it with [`succeed`](Self::succeed), [`fail`](Self::fail) or
/// feeds it [`progress`](Self::progress). Cancelling the token unwinds the
/// parked visit immediately with `on_cancel` + `on_finish`.
///
/// Only one visit is in flight at a time; starting a new one interrupts the
/// previous, the way a navigation dispatcher would.
#[derive(Default)]
pub struct MemoryDispatcher {
    active: Rc<RefCell<Option<InFlight>>>,
    next_id: Cell<u64>,
    log: RefCell<Vec<Visit>>,
}

impl MemoryDispatcher {
    /// Create an idle dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// The visits that made it past their `before` gate, in order.
    pub fn submitted(&self) -> Vec<Visit> {
        self.log.borrow().clone()
    }

    /// Whether a visit is currently parked.
    pub fn in_flight(&self) -> bool {
        self.active.borrow().is_some()
    }

    /// Resolve the parked visit with a page.
    pub fn succeed(&self, page: Page) {
        let active = self.active.borrow_mut().take();
        let Some(mut active) = active else { return };
        if active.token.is_cancelled() {
            unwind_cancelled(active);
            return;
        }
        tracing::trace!(url = %active.visit.url, "visit succeeded");
        if let Some(f) = active.options.on_success.as_mut() {
            f(&page);
        }
        if let Some(f) = active.options.on_finish.as_mut() {
            f();
        }
    }

    /// Resolve the parked visit with validation errors.
    pub fn fail(&self, errors: Errors) {
        let active = self.active.borrow_mut().take();
        let Some(mut active) = active else { return };
        if active.token.is_cancelled() {
            unwind_cancelled(active);
            return;
        }
        tracing::trace!(url = %active.visit.url, "visit failed");
        if let Some(f) = active.options.on_error.as_mut() {
            f(&errors);
        }
        if let Some(f) = active.options.on_finish.as_mut() {
            f();
        }
    }

    /// Feed the parked visit a progress event.
    pub fn progress(&self, progress: Progress) {
        // take the visit out so the callback may reenter the dispatcher
        let active = self.active.borrow_mut().take();
        let Some(mut active) = active else { return };
        if let Some(f) = active.options.on_progress.as_mut() {
            f(&progress);
        }
        if active.token.is_cancelled() {
            unwind_cancelled(active);
            return;
        }
        let mut slot = self.active.borrow_mut();
        if slot.is_none() {
            *slot = Some(active);
        }
    }

    fn begin(&self, visit: Visit, mut options: VisitOptions) {
        if let Some(f) = options.on_before.as_mut() {
            if !f(&visit) {
                tracing::debug!(url = %visit.url, "visit aborted before start");
                return;
            }
        }

        // a navigation dispatcher carries one visit at a time
        let previous = self.active.borrow_mut().take();
        if let Some(previous) = previous {
            tracing::debug!(url = %previous.visit.url, "interrupting in-flight visit");
            unwind_cancelled(previous);
        }

        let id = self.next_id.get();
        self.next_id.set(id + 1);

        // a stale token from an interrupted visit must not abort a newer one
        let slot = Rc::clone(&self.active);
        let token = CancelToken::new(move || {
            let active = {
                let mut slot = slot.borrow_mut();
                match slot.as_ref() {
                    Some(active) if active.id == id => slot.take(),
                    _ => None,
                }
            };
            if let Some(active) = active {
                unwind_cancelled(active);
            }
        });

        if let Some(f) = options.on_cancel_token.as_mut() {
            f(token.clone());
        }
        if let Some(f) = options.on_start.as_mut() {
            f(&visit);
        }
        tracing::trace!(method = %visit.method, url = %visit.url, "visit started");

        self.log.borrow_mut().push(visit.clone());
        *self.active.borrow_mut() = Some(InFlight {
            id,
            visit,
            options,
            token,
        });
    }
}

impl Dispatcher for MemoryDispatcher {
    fn submit(&self, method: Method, url: &str, payload: Value, options: VisitOptions) {
        let visit = Visit {
            method,
            url: url.to_string(),
            data: payload,
        };
        self.begin(visit, options);
    }

    fn delete(&self, url: &str, mut options: VisitOptions) {
        let visit = Visit {
            method: Method::Delete,
            url: url.to_string(),
            data: options.data.take().unwrap_or(Value::Null),
        };
        self.begin(visit, options);
    }
}

fn unwind_cancelled(mut active: InFlight) {
    tracing::trace!(url = %active.visit.url, "visit cancelled");
    if let Some(f) = active.options.on_cancel.as_mut() {
        f();
    }
    if let Some(f) = active.options.on_finish.as_mut() {
        f();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolving_with_nothing_in_flight_is_a_noop() {
        let dispatcher = MemoryDispatcher::new();
        dispatcher.succeed(Page::new("home", "/"));
        dispatcher.fail(Errors::default());
        dispatcher.progress(Progress::new(1, None));
        assert!(!dispatcher.in_flight());
    }

    #[test]
    fn delete_takes_its_body_from_the_options() {
        let dispatcher = MemoryDispatcher::new();
        let options = VisitOptions::default().data(serde_json::json!({"id": 7}));
        dispatcher.delete("/items/7", options);

        let submitted = dispatcher.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].method, Method::Delete);
        assert_eq!(submitted[0].data, serde_json::json!({"id": 7}));
    }
}
