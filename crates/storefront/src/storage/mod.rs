//! Local persistence adapter.
//!
//! Everything a browser would keep in `localStorage` lives behind the
//! [`KeyValueStore`] capability: a mapping from string key to a JSON-encoded
//! string value. Records are always read and written whole.
//!
//! # Backends
//!
//! - [`MemoryStore`] - in-process map, used by tests and as the working copy
//!   of a browser session
//! - [`FileStore`] - a JSON file on disk, used by the CLI as a browser profile
//! - [`BrowserStorage`] - an axum extractor that loads the per-visitor snapshot
//!   from the `tower-sessions` session and writes it back on commit
//!
//! # Failure model
//!
//! Reads that fail (backend unavailable, corrupt JSON, wrong shape) degrade to
//! "absent" and writes that fail are dropped; both are logged at `warn`. The
//! storefront never fails a page because storage misbehaved. Callers that need
//! to see the error use [`StorageExt::try_get`] / [`StorageExt::try_set`].

mod browser;
mod file;
mod memory;

pub use browser::BrowserStorage;
pub use file::FileStore;
pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Well-known storage keys and the JSON shape stored under each.
pub mod keys {
    /// Sequence of `CartLineItem`.
    pub const CART_ITEMS: &str = "cartItems";

    /// Sequence of `UserRecord`.
    pub const USERS: &str = "users";

    /// The logged-in `CurrentUser`, or absent.
    pub const CURRENT_USER: &str = "currentUser";

    /// `CacheEnvelope` of catalog entries.
    pub const PRODUCTS_CACHE: &str = "productsCache";
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend could not be reached (poisoned lock, disabled storage).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored value was not valid JSON for the requested type.
    #[error("storage JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// String-keyed store of JSON-encoded values.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw JSON string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the raw JSON string stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Typed JSON helpers available on every [`KeyValueStore`].
pub trait StorageExt: KeyValueStore {
    /// Read and decode the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend fails or the value does not
    /// decode as `T`.
    fn try_get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_raw(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encode and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or the backend write fails.
    fn try_set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_raw(key, raw)
    }

    /// Read the value under `key`, treating any failure as absent.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.try_get(key).unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "storage read failed, using default");
            None
        })
    }

    /// Read the value under `key`, falling back to `T::default()`.
    fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.get(key).unwrap_or_default()
    }

    /// Store `value` under `key`, logging and dropping any failure.
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        if let Err(e) = self.try_set(key, value) {
            tracing::warn!(key, error = %e, "storage write failed, change not persisted");
        }
    }

    /// Delete `key`, logging and dropping any failure.
    fn delete(&self, key: &str) {
        if let Err(e) = self.remove(key) {
            tracing::warn!(key, error = %e, "storage delete failed");
        }
    }
}

impl<S: KeyValueStore + ?Sized> StorageExt for S {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A backend that behaves like storage disabled by the browser.
    struct DisabledStore;

    impl KeyValueStore for DisabledStore {
        fn get_raw(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }

        fn set_raw(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disabled".to_string()))
        }
    }

    #[test]
    fn test_typed_roundtrip() {
        let store = MemoryStore::new();
        store.set(keys::CART_ITEMS, &vec![1, 2, 3]);
        let values: Vec<i32> = store.get_or_default(keys::CART_ITEMS);
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_corrupt_value_reads_as_absent() {
        let store = MemoryStore::new();
        store.set_raw(keys::USERS, "{not json".to_string()).unwrap();
        assert!(store.get::<Vec<String>>(keys::USERS).is_none());
        assert!(store.try_get::<Vec<String>>(keys::USERS).is_err());
    }

    #[test]
    fn test_wrong_shape_reads_as_absent() {
        let store = MemoryStore::new();
        store.set(keys::CART_ITEMS, &"a string, not a list");
        let values: Vec<i32> = store.get_or_default(keys::CART_ITEMS);
        assert!(values.is_empty());
    }

    #[test]
    fn test_disabled_backend_degrades_silently() {
        let store = DisabledStore;
        store.set(keys::CART_ITEMS, &vec![1]);
        store.delete(keys::CURRENT_USER);
        let values: Vec<i32> = store.get_or_default(keys::CART_ITEMS);
        assert!(values.is_empty());
    }

    #[test]
    fn test_works_through_trait_object() {
        let store = MemoryStore::new();
        let dyn_store: &dyn KeyValueStore = &store;
        dyn_store.set(keys::CURRENT_USER, &"someone");
        assert_eq!(
            dyn_store.get::<String>(keys::CURRENT_USER).as_deref(),
            Some("someone")
        );
    }
}
