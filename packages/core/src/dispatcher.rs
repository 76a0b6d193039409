use serde_json::Value;

use crate::{Method, VisitOptions};

/// The external router seam.
///
/// A dispatcher performs visits: it owns the wire, history, and page
/// resolution, and reports the lifecycle of each visit back through the
/// callbacks in [`VisitOptions`]. Submission is fire-and-forget from the
/// caller's perspective; the outcome arrives later through the callbacks,
/// in the fixed order documented on [`VisitOptions`].
///
/// The delete verb is the odd one out: its request body travels in the
/// `data` slot of [`VisitOptions`] rather than as a positional payload, so
/// it gets a dedicated entry point.
pub trait Dispatcher {
    /// Perform a visit with a non-delete verb.
    fn submit(&self, method: Method, url: &str, payload: Value, options: VisitOptions);

    /// Perform a delete visit. The request body, if any, rides in the
    /// `data` slot of the options.
    fn delete(&self, url: &str, options: VisitOptions);
}
