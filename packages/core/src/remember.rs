use std::cell::RefCell;

use rustc_hash::FxHashMap;
use serde_json::Value;

/// The persistence adapter seam: durable key/value mirroring for state that
/// should survive page reloads.
///
/// Consumers write JSON snapshots under caller-supplied keys and read them
/// back on construction. What "durable" means (session storage, disk, a
/// history entry) is the host's business.
pub trait RememberStore {
    /// Read the snapshot stored under `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store a snapshot under `key`, replacing any previous one.
    fn set(&self, key: &str, value: Value);

    /// Drop the snapshot stored under `key`.
    fn remove(&self, key: &str);
}

/// A [`RememberStore`] that keeps snapshots in memory.
///
/// Nothing survives the process, but state does survive controller
/// re-creation, which is what the tests (and headless embeddings) need.
#[derive(Default)]
pub struct MemoryStore {
    state: RefCell<FxHashMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    /// Whether the store holds no snapshots.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }
}

impl RememberStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.state.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.state.borrow_mut().insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.state.borrow_mut().remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_round_trip() {
        let store = MemoryStore::new();
        store.set("login:data", serde_json::json!({"email": "ada@example.com"}));

        assert_eq!(
            store.get("login:data"),
            Some(serde_json::json!({"email": "ada@example.com"}))
        );

        store.remove("login:data");
        assert_eq!(store.get("login:data"), None);
        assert!(store.is_empty());
    }
}
