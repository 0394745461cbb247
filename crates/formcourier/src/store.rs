//! Persistent key-value state for formcourier.
//!
//! Rate-limit state lives in a tiny string-to-string store, modeled after the
//! browser's local storage the original workflow used. The store is injected
//! behind the [`StateStore`] trait so the submission controller can be tested
//! deterministically; [`FileStore`] persists to a single JSON file under the
//! platform data directory and [`MemoryStore`] keeps everything in memory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A persistent string key-value store.
///
/// Values are opaque strings; callers own their serialization. Every write
/// is durable before `set`/`remove` returns.
pub trait StateStore {
    /// Get the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// File-backed state store.
///
/// The whole store is one JSON object persisted atomically on every write
/// (write to a sibling temp file, then rename). A corrupt state file is
/// treated as empty rather than fatal, matching how the original workflow
/// recovered from unparseable local storage.
#[derive(Debug)]
pub struct FileStore {
    /// Path to the state file.
    path: PathBuf,
    /// In-memory view of the persisted entries.
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open or create a state store at the given path.
    ///
    /// Creates the parent directories if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created or the
    /// state file exists but cannot be read.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let entries = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| Error::StoreRead {
                path: path.clone(),
                source,
            })?;
            match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(err) => {
                    warn!("State file {} is corrupt, starting fresh: {err}", path.display());
                    BTreeMap::new()
                }
            }
        } else {
            debug!("No state file at {}, starting empty", path.display());
            BTreeMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Get the path to the state file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| Error::StoreWrite {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| Error::StoreWrite {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// In-memory state store for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}
