//! Local persistent store
//!
//! Entity maps are kept as JSON objects keyed by entity id, one object per
//! storage key. A [`KeyValueStore`] supplies the raw durable strings; the
//! [`LocalStore`] layered on top never fails: a missing or corrupt payload
//! loads as an empty map, and write failures are logged and dropped.
//!
//! Each save rewrites the whole map, so the last completed write wins.
//! Two processes writing the same directory can lose each other's updates.

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Storage key for the profile map
pub const PROFILES_KEY: &str = "mock-server-profiles";
/// Storage key for the job map
pub const JOBS_KEY: &str = "mock-server-jobs";
/// Storage key for the application map
pub const APPLICATIONS_KEY: &str = "mock-server-applications";
/// Storage key for the auth user map
pub const USERS_KEY: &str = "mock-server-users";

/// Entity map in insertion order
pub type EntityMap<T> = IndexMap<String, T>;

/// Durable string storage addressed by key
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: &str) -> io::Result<()>;
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let target = self.path_for(key);
        // Readers see either the old file or the new one, never a partial write.
        let staging = target.with_extension("json.tmp");
        fs::write(&staging, value)?;
        fs::rename(&staging, &target)
    }
}

/// Process-lifetime storage, used when no data directory is configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> io::Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Best-effort JSON persistence of entity maps
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish_non_exhaustive()
    }
}

impl LocalStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Store backed by the process memory only
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Store backed by JSON files in `dir`
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileStore::new(dir)))
    }

    /// Load the map under `key`; absent or malformed data loads as empty
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> EntityMap<T> {
        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return IndexMap::new(),
            Err(err) => {
                warn!("Failed to read {} from local storage: {}", key, err);
                return IndexMap::new();
            }
        };

        match serde_json::from_str::<EntityMap<T>>(&raw) {
            Ok(map) => {
                debug!("Loaded {} entries from {}", map.len(), key);
                map
            }
            Err(err) => {
                warn!("Discarding malformed {} payload: {}", key, err);
                IndexMap::new()
            }
        }
    }

    /// Serialize and write the whole map under `key`; failures are logged only
    pub fn save<T: Serialize>(&self, key: &str, map: &EntityMap<T>) {
        let json = match serde_json::to_string(map) {
            Ok(json) => json,
            Err(err) => {
                warn!("Failed to serialize {}: {}", key, err);
                return;
            }
        };

        if let Err(err) = self.backend.set(key, &json) {
            warn!("Failed to save {} to local storage: {}", key, err);
        }
    }
}
