use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The verb a visit is performed with.
///
/// Dispatchers treat [`Method::Delete`] specially: its payload travels in
/// the `data` slot of [`VisitOptions`](crate::VisitOptions) rather than as
/// a positional argument. See [`Dispatcher`](crate::Dispatcher).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Fetch a page without a request body.
    Get,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Partially update.
    Patch,
    /// Remove. The body, if any, rides in the visit options.
    Delete,
}

impl Method {
    /// The lowercase wire name of the verb.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized verb name.
#[derive(Clone, PartialEq, Eq, Debug, thiserror::Error)]
#[error("unknown visit method `{0}`")]
pub struct UnknownMethod(pub String);

impl FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Method::Get),
            "post" => Ok(Method::Post),
            "put" => Ok(Method::Put),
            "patch" => Ok(Method::Patch),
            "delete" => Ok(Method::Delete),
            other => Err(UnknownMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("POST".parse::<Method>(), Ok(Method::Post));
        assert_eq!("delete".parse::<Method>(), Ok(Method::Delete));
        assert!("trace".parse::<Method>().is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Method::Patch.to_string(), "patch");
    }
}
