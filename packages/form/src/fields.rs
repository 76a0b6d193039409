//! Field-level access to a typed record through its JSON shape.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::FormError;

pub(crate) fn to_object<T: Serialize>(data: &T) -> Result<Map<String, Value>, FormError> {
    match serde_json::to_value(data)? {
        Value::Object(map) => Ok(map),
        _ => Err(FormError::NotAnObject),
    }
}

pub(crate) fn from_object<T: DeserializeOwned>(map: Map<String, Value>) -> Result<T, FormError> {
    Ok(serde_json::from_value(Value::Object(map))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[test]
    fn record_round_trips() {
        let map = to_object(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(map.get("x"), Some(&Value::from(1)));
        let point: Point = from_object(map).unwrap();
        assert_eq!(point, Point { x: 1, y: 2 });
    }

    #[test]
    fn non_records_are_rejected() {
        assert!(matches!(to_object(&42), Err(FormError::NotAnObject)));
    }
}
