//! Synchronous string-keyed identity storage.
//!
//! The visitor and session managers keep their state in an
//! [`IdentityStore`]. Reads and writes are local and never suspend; the
//! store only has to offer `get` and `set`.
//!
//! # Implementations
//!
//! | Type | Durability | Use |
//! |------|------------|-----|
//! | [`MemoryStore`] | process lifetime | tests, ephemeral hosts |
//! | [`FileStore`] | survives restarts | hosts with a writable data directory |

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::DbError;

/// Durable string-keyed storage used for visitor and session identity.
pub trait IdentityStore: Send + Sync {
    /// Read the value stored at `key`, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, DbError>;

    /// Store `value` at `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), DbError>;
}

/// Shared handle to an identity store.
pub type SharedStore = Arc<dyn IdentityStore>;

fn lock(entries: &Mutex<BTreeMap<String, String>>) -> Result<MutexGuard<'_, BTreeMap<String, String>>, DbError> {
    entries
        .lock()
        .map_err(|e| DbError::Poisoned(e.to_string()))
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process identity store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store behind a [`SharedStore`] handle.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Remove every key, as an external storage clearance would.
    pub fn clear(&self) -> Result<(), DbError> {
        lock(&self.entries)?.clear();
        Ok(())
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        lock(&self.entries).map_or(0, |entries| entries.len())
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdentityStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        lock(&self.entries)?.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Identity store persisted as a single JSON object on disk.
///
/// The file is loaded once on [`FileStore::open`] and rewritten in full on
/// every `set` via a temporary file and rename, so a crash mid-write leaves
/// the previous contents intact.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, creating an empty one if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Io`] if the file exists but cannot be read, or
    /// [`DbError::Serialization`] if it is not a JSON object of strings.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened identity store");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), DbError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl IdentityStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, DbError> {
        Ok(lock(&self.entries)?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), DbError> {
        let mut entries = lock(&self.entries)?;
        entries.insert(key.to_owned(), value.to_owned());
        self.persist(&entries)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("footprint-kv-{}-{name}", std::process::id()))
            .join("identity.json")
    }

    #[test]
    fn memory_store_get_set() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(store.len(), 1);
        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = temp_path("reopen");
        let _ = fs::remove_file(&path);

        let store = FileStore::open(&path).unwrap();
        store.set("footprint_visitor_id", "v_1_abc").unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("footprint_visitor_id").unwrap().as_deref(),
            Some("v_1_abc")
        );
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn file_store_rejects_corrupt_file() {
        let path = temp_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();
        assert!(matches!(FileStore::open(&path), Err(DbError::Serialization(_))));
        let _ = fs::remove_file(&path);
    }
}
