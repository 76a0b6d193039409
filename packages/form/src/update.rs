use peregrine_core::Errors;
use serde_json::{Map, Value};

/// How [`Form::set_data`](crate::Form::set_data) should change the data
/// record.
///
/// The dynamic "key, function, or whole object" calling convention becomes
/// explicit variants dispatched by `match`; the convenience wrappers on
/// [`Form`](crate::Form) construct these for you.
pub enum SetData<T> {
    /// Replace the whole record.
    Replace(T),
    /// Compute the new record from the old one with a pure function.
    With(Box<dyn FnOnce(&T) -> T>),
    /// Set a single field by name.
    Field(String, Value),
}

/// How [`Form::set_defaults`](crate::Form::set_defaults) should change the
/// defaults snapshot.
pub enum SetDefaults {
    /// Rebase the defaults to the current data, leaving data untouched.
    Rebase,
    /// Set a single default field by name.
    Field(String, Value),
    /// Merge several default fields at once.
    Merge(Map<String, Value>),
}

/// How [`Form::set_error`](crate::Form::set_error) should merge into the
/// error bag.
///
/// Caller-initiated error mutations merge incrementally; only the
/// dispatcher's `on_error` replaces the bag wholesale.
pub enum SetError {
    /// Set the message for one field.
    Field(String, String),
    /// Merge several field messages at once.
    Many(Errors),
}
