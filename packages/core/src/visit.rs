use std::fmt;

use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::{CancelToken, Method, Page, Progress};

/// Validation errors keyed by field name.
///
/// This is the only error kind a visit reports: the dispatcher delivers the
/// whole bag through `on_error`, replacing whatever the consumer held before.
pub type Errors = FxHashMap<String, String>;

/// A visit that is about to be, or currently is, in flight.
#[derive(Clone, PartialEq, Debug)]
pub struct Visit {
    /// The verb the visit is performed with.
    pub method: Method,
    /// The target URL.
    pub url: String,
    /// The request payload.
    pub data: Value,
}

/// Per-visit options: passthrough knobs the dispatcher consumes plus the
/// eight named lifecycle callbacks.
///
/// Callbacks for a single visit fire in a fixed order the dispatcher
/// guarantees:
///
/// ```text
/// before → cancel token → start → progress* → (success | error | cancel) → finish
/// ```
///
/// A visit aborted from `on_before` (by returning `false`) fires nothing
/// further. A cancelled visit still fires `on_cancel` and then `on_finish`.
///
/// Options are built chainably:
///
/// ```rust
/// use peregrine_core::VisitOptions;
///
/// let options = VisitOptions::default()
///     .preserve_scroll()
///     .on_success(|page| println!("landed on {}", page.component));
/// ```
#[derive(Default)]
pub struct VisitOptions {
    /// Request body for verbs that carry it out of band (delete).
    pub data: Option<Value>,
    /// Extra request headers.
    pub headers: FxHashMap<String, String>,
    /// Keep the scroll position across the page swap.
    pub preserve_scroll: bool,
    /// Keep component state across the page swap.
    pub preserve_state: bool,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
    /// Receives the abort capability when the visit starts.
    pub on_cancel_token: Option<Box<dyn FnMut(CancelToken)>>,
    /// Fires before anything else; returning `false` aborts the visit.
    pub on_before: Option<Box<dyn FnMut(&Visit) -> bool>>,
    /// Fires when the visit is actually started.
    pub on_start: Option<Box<dyn FnMut(&Visit)>>,
    /// Fires on each upload progress event.
    pub on_progress: Option<Box<dyn FnMut(&Progress)>>,
    /// Fires when the visit resolves to a page.
    pub on_success: Option<Box<dyn FnMut(&Page)>>,
    /// Fires when the visit resolves to validation errors.
    pub on_error: Option<Box<dyn FnMut(&Errors)>>,
    /// Fires when the visit is cancelled.
    pub on_cancel: Option<Box<dyn FnMut()>>,
    /// Always fires last, however the visit settled.
    pub on_finish: Option<Box<dyn FnMut()>>,
}

impl VisitOptions {
    /// Options with no callbacks and default knobs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the out-of-band request body.
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Add a request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Keep the scroll position across the page swap.
    pub fn preserve_scroll(mut self) -> Self {
        self.preserve_scroll = true;
        self
    }

    /// Keep component state across the page swap.
    pub fn preserve_state(mut self) -> Self {
        self.preserve_state = true;
        self
    }

    /// Replace the current history entry instead of pushing.
    pub fn replace(mut self) -> Self {
        self.replace = true;
        self
    }

    /// Receive the abort capability when the visit starts.
    pub fn on_cancel_token(mut self, f: impl FnMut(CancelToken) + 'static) -> Self {
        self.on_cancel_token = Some(Box::new(f));
        self
    }

    /// Run before anything else; return `false` to abort the visit.
    pub fn on_before(mut self, f: impl FnMut(&Visit) -> bool + 'static) -> Self {
        self.on_before = Some(Box::new(f));
        self
    }

    /// Run when the visit is actually started.
    pub fn on_start(mut self, f: impl FnMut(&Visit) + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Run on each upload progress event.
    pub fn on_progress(mut self, f: impl FnMut(&Progress) + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Run when the visit resolves to a page.
    pub fn on_success(mut self, f: impl FnMut(&Page) + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Run when the visit resolves to validation errors.
    pub fn on_error(mut self, f: impl FnMut(&Errors) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Run when the visit is cancelled.
    pub fn on_cancel(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_cancel = Some(Box::new(f));
        self
    }

    /// Run last, however the visit settled.
    pub fn on_finish(mut self, f: impl FnMut() + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for VisitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisitOptions")
            .field("data", &self.data)
            .field("headers", &self.headers)
            .field("preserve_scroll", &self.preserve_scroll)
            .field("preserve_state", &self.preserve_state)
            .field("replace", &self.replace)
            .field("on_cancel_token", &self.on_cancel_token.is_some())
            .field("on_before", &self.on_before.is_some())
            .field("on_start", &self.on_start.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_cancel", &self.on_cancel.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}
