//! Typed access to the single persistent key-value store.
//!
//! Every value is stored as JSON under a fixed key (see [`keys`]). Each
//! successful write is announced on a broadcast channel so open views and
//! the background scheduler can react without polling.

pub mod backend;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

use crate::database::Database;
use crate::types::errors::StorageError;

pub use backend::{MemoryBackend, SqliteBackend, StorageBackend};

/// Storage keys used by the application.
pub mod keys {
    pub const LINKS: &str = "saved_links";
    pub const CATEGORIES: &str = "categories";
    pub const ARCHIVE_SETTINGS: &str = "archive_settings";
    pub const TRASH_SETTINGS: &str = "trash_settings";
    pub const REMINDER_SETTINGS: &str = "reminder_settings";
    pub const ONBOARDING_SEEN: &str = "has_seen_onboarding";
    pub const REORDER_STATE: &str = "reorder_state";
}

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Announces that the value under `key` was written or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
}

/// Cheaply clonable handle to the store.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn StorageBackend>,
    changes: broadcast::Sender<StorageChange>,
}

impl Storage {
    pub fn new<B: StorageBackend + 'static>(backend: B) -> Self {
        Self::from_arc(Arc::new(backend))
    }

    /// Wraps a shared backend, e.g. one a test keeps a handle to.
    pub fn from_arc(backend: Arc<dyn StorageBackend>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { backend, changes }
    }

    pub fn sqlite(db: Database) -> Self {
        Self::new(SqliteBackend::new(db))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Reads and decodes the value under `key`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.backend.read(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Like [`get`](Self::get) but substitutes `T::default()` for a missing key.
    pub fn get_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StorageError> {
        Ok(self.get(key)?.unwrap_or_default())
    }

    /// Encodes and writes `value`, replacing whatever was stored.
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.backend.write(key, &raw)?;
        trace!(key, bytes = raw.len(), "storage write");
        self.notify(key);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.backend.delete(key)?;
        self.notify(key);
        Ok(())
    }

    /// Subscribes to change notifications for every key.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }

    fn notify(&self, key: &str) {
        // No receivers is fine.
        let _ = self.changes.send(StorageChange {
            key: key.to_string(),
        });
    }
}
