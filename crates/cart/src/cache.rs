//! Local persistent cache for the cart.
//!
//! The cart is mirrored into a small key-value store so a restart shows the
//! last known cart immediately, before any request completes. Three entries
//! are kept: the serialized line items, the serialized total and the
//! anonymous cart session id.
//!
//! The store writes through on every change. A failed write is logged and
//! never fails the cart operation that caused it; a missing or corrupt entry
//! loads as empty.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use shopfront_core::{CartSessionId, Money};
use thiserror::Error;
use tracing::{debug, warn};

use crate::model::{CartLineItem, CartSnapshot};

/// Storage key of the serialized line items.
pub const ITEMS_KEY: &str = "cartItems";
/// Storage key of the serialized cart total.
pub const TOTAL_KEY: &str = "cartTotal";
/// Storage key of the anonymous cart session id.
pub const SESSION_KEY: &str = "cartSessionId";

/// Errors from a [`LocalStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

// =============================================================================
// LocalStorage
// =============================================================================

/// Durable string key-value storage.
///
/// Only the cart store writes the cart keys, so implementations need no
/// cross-process locking.
pub trait LocalStorage: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// File-backed storage: one file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the storage directory. It is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;
        // write-then-rename so a crash never leaves a half-written entry
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// CartCache
// =============================================================================

/// What the cache held at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CachedCart {
    pub snapshot: CartSnapshot,
    pub session_id: Option<CartSessionId>,
}

/// Typed view of the three cart entries in a [`LocalStorage`].
#[derive(Clone)]
pub struct CartCache {
    storage: Arc<dyn LocalStorage>,
}

impl CartCache {
    /// Wrap a storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    /// Load the cached cart. Missing or unreadable entries load as empty.
    #[must_use]
    pub fn load(&self) -> CachedCart {
        let items: Vec<CartLineItem> = self.read_json(ITEMS_KEY).unwrap_or_default();
        let total: Money = self.read_json(TOTAL_KEY).unwrap_or_default();
        let session_id: Option<CartSessionId> = self.read_json(SESSION_KEY);

        debug!(
            items = items.len(),
            has_session = session_id.is_some(),
            "Loaded cart from local cache"
        );

        CachedCart {
            snapshot: CartSnapshot { items, total },
            session_id,
        }
    }

    /// Persist items and total.
    pub fn write_snapshot(&self, snapshot: &CartSnapshot) {
        self.write_json(ITEMS_KEY, &snapshot.items);
        self.write_json(TOTAL_KEY, &snapshot.total);
    }

    /// Persist the session id, deleting the entry when `None`.
    pub fn write_session_id(&self, session_id: Option<&CartSessionId>) {
        match session_id {
            Some(id) => self.write_json(SESSION_KEY, id),
            None => {
                if let Err(e) = self.storage.remove(SESSION_KEY) {
                    warn!(key = SESSION_KEY, error = %e, "Failed to clear cached cart entry");
                }
            }
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.storage.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Failed to read cached cart entry");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "Discarding corrupt cached cart entry");
                None
            }
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(StorageError::from)
            .and_then(|json| self.storage.set(key, &json));

        if let Err(e) = result {
            warn!(key, error = %e, "Failed to write cached cart entry");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::{CartLineId, ProductId, Quantity};

    use super::*;
    use crate::model::DEFAULT_COLOR;

    fn sample_snapshot() -> CartSnapshot {
        CartSnapshot {
            items: vec![CartLineItem {
                id: CartLineId::new(101),
                product_id: ProductId::new(7),
                quantity: Quantity::new(2).unwrap(),
                price: Money::from(1500),
                color: DEFAULT_COLOR.to_string(),
                name: Some("Mug".to_string()),
                image: Some("mug.png".to_string()),
            }],
            total: Money::from(3000),
        }
    }

    #[test]
    fn test_empty_storage_loads_empty_cart() {
        let cache = CartCache::new(Arc::new(MemoryStorage::new()));
        assert_eq!(cache.load(), CachedCart::default());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = CartCache::new(storage.clone());
        cache.write_snapshot(&sample_snapshot());
        cache.write_session_id(Some(&CartSessionId::parse("sess-abc").unwrap()));

        let loaded = CartCache::new(storage).load();
        assert_eq!(loaded.snapshot, sample_snapshot());
        assert_eq!(loaded.session_id.unwrap().as_str(), "sess-abc");
    }

    #[test]
    fn test_clearing_session_id_removes_entry() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = CartCache::new(storage.clone());
        cache.write_session_id(Some(&CartSessionId::parse("sess-abc").unwrap()));
        cache.write_session_id(None);

        assert!(storage.get(SESSION_KEY).unwrap().is_none());
        assert!(cache.load().session_id.is_none());
    }

    #[test]
    fn test_corrupt_entries_load_as_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(ITEMS_KEY, "not json").unwrap();
        storage.set(TOTAL_KEY, "\"abc\"").unwrap();
        storage.set(SESSION_KEY, "\"\"").unwrap();

        let loaded = CartCache::new(storage).load();
        assert!(loaded.snapshot.is_empty());
        assert!(loaded.snapshot.total.is_zero());
        assert!(loaded.session_id.is_none());
    }

    #[test]
    fn test_file_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("cache"));

        assert!(storage.get(ITEMS_KEY).unwrap().is_none());
        storage.set(ITEMS_KEY, "[]").unwrap();
        assert_eq!(storage.get(ITEMS_KEY).unwrap().as_deref(), Some("[]"));

        storage.remove(ITEMS_KEY).unwrap();
        storage.remove(ITEMS_KEY).unwrap();
        assert!(storage.get(ITEMS_KEY).unwrap().is_none());
    }

    #[test]
    fn test_file_storage_rejects_path_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(storage.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_file_backed_cart_cache_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        CartCache::new(Arc::new(FileStorage::new(dir.path()))).write_snapshot(&sample_snapshot());

        let reopened = CartCache::new(Arc::new(FileStorage::new(dir.path()))).load();
        assert_eq!(reopened.snapshot, sample_snapshot());
    }
}
