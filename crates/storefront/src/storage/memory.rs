//! In-memory key-value store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{KeyValueStore, StorageError};

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, String>,
    dirty: bool,
}

/// Thread-safe in-memory [`KeyValueStore`].
///
/// Also serves as the working copy of a visitor's browser storage: it can be
/// built from and exported to a plain map, and remembers whether anything was
/// written since it was loaded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with raw JSON strings.
    #[must_use]
    pub fn from_snapshot(entries: HashMap<String, String>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                entries,
                dirty: false,
            }),
        }
    }

    /// Copy out every entry.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock()
            .map(|state| state.entries.clone())
            .unwrap_or_default()
    }

    /// Whether any write or delete happened since creation.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.lock().is_ok_and(|state| state.dirty)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.entries.insert(key.to_string(), value);
        state.dirty = true;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        state.entries.remove(key);
        state.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_roundtrip_is_clean() {
        let mut entries = HashMap::new();
        entries.insert("cartItems".to_string(), "[]".to_string());
        let store = MemoryStore::from_snapshot(entries);

        assert!(!store.is_dirty());
        assert_eq!(store.get_raw("cartItems").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_writes_mark_dirty() {
        let store = MemoryStore::new();
        store.set_raw("users", "[]".to_string()).unwrap();
        assert!(store.is_dirty());
        assert_eq!(store.snapshot().len(), 1);

        let store = MemoryStore::new();
        store.remove("users").unwrap();
        assert!(store.is_dirty());
    }
}
