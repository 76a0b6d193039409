use thiserror::Error;

/// Errors surfaced by structural form operations.
///
/// These never come from the dispatcher: validation errors arrive through
/// the visit lifecycle as an error bag, not as a `FormError`.
#[derive(Debug, Error)]
pub enum FormError {
    /// The form data, a field value, or the transform output failed to
    /// serialize or deserialize.
    #[error("form data serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A field-level operation was attempted on a form type that does not
    /// serialize to a JSON object.
    #[error("form data does not serialize to an object")]
    NotAnObject,

    /// A field name that is not part of the record's shape.
    #[error("unknown form field `{0}`")]
    UnknownField(String),
}
