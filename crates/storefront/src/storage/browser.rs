//! Per-visitor browser storage carried in the HTTP session.
//!
//! Each visitor's cookie identifies a `tower-sessions` session; that session
//! holds the visitor's whole key-value map under [`SESSION_KEY`]. Handlers
//! extract a [`BrowserStorage`], work on it synchronously through
//! [`KeyValueStore`], and call [`BrowserStorage::commit`] before responding.

use std::collections::HashMap;

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;
use tower_sessions::Session;

use super::{KeyValueStore, MemoryStore, StorageError};

/// Session key holding the visitor's key-value map.
pub const SESSION_KEY: &str = "browser_storage";

/// A visitor's key-value storage, loaded from their session.
pub struct BrowserStorage {
    session: Session,
    store: MemoryStore,
}

impl BrowserStorage {
    /// Load the visitor's storage from `session`.
    ///
    /// An unreadable session is treated as empty storage.
    pub async fn load(session: Session) -> Self {
        let entries = match session.get::<HashMap<String, String>>(SESSION_KEY).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load browser storage, starting empty");
                HashMap::new()
            }
        };

        Self {
            session,
            store: MemoryStore::from_snapshot(entries),
        }
    }

    /// The session this storage was loaded from.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Write changes back to the session.
    ///
    /// Does nothing if nothing was written. A failed write is logged and the
    /// change is lost, the same way a full `localStorage` drops writes.
    pub async fn commit(&self) {
        if !self.store.is_dirty() {
            return;
        }

        if let Err(e) = self
            .session
            .insert(SESSION_KEY, self.store.snapshot())
            .await
        {
            tracing::warn!(error = %e, "failed to persist browser storage");
        }
    }
}

impl KeyValueStore for BrowserStorage {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.store.get_raw(key)
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.store.set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.store.remove(key)
    }
}

impl<S> FromRequestParts<S> for BrowserStorage
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Self::load(session).await)
    }
}
