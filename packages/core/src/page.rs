use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The page a successful visit resolves to.
///
/// This is the dispatcher's business to produce; consumers only read it in
/// their `on_success` callbacks.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Page {
    /// Name of the component the page renders with.
    pub component: String,
    /// Props for that component.
    #[serde(default)]
    pub props: Value,
    /// The URL the visit landed on, after any server-side redirects.
    pub url: String,
    /// Asset version, used by dispatchers to force full reloads when stale.
    #[serde(default)]
    pub version: Option<String>,
}

impl Page {
    /// Create a page with empty props and no version.
    pub fn new(component: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            props: Value::Null,
            url: url.into(),
            version: None,
        }
    }

    /// Attach props.
    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }
}
