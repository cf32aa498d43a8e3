use crate::error::{AppError, AppResult};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key under which the user-supplied API key is persisted
pub const CREDENTIAL_KEY: &str = "api-credential";

/// Minimal key-value persistence used for session state.
///
/// The history store and the credential helpers are the only writers; every
/// value is an opaque string (JSON for the history blob, the bare key string
/// for the credential).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn remove(&self, key: &str) -> AppResult<()>;
}

/// File-backed store: one file per key inside a data directory.
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(dir: impl AsRef<Path>) -> AppResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("cannot create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(format!("cannot read '{}': {}", key, e))),
        }
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        fs::write(self.path_for(key), value)
            .map_err(|e| AppError::Storage(format!("cannot write '{}': {}", key, e)))
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("cannot remove '{}': {}", key, e))),
        }
    }
}

/// In-memory store for ephemeral sessions and tests.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> AppResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| AppError::Storage("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Read the stored API key, if any.
pub fn stored_api_key(store: &dyn KeyValueStore) -> AppResult<Option<String>> {
    Ok(store
        .get(CREDENTIAL_KEY)?
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()))
}

/// Persist the user-supplied API key.
pub fn store_api_key(store: &dyn KeyValueStore, api_key: &str) -> AppResult<()> {
    store.set(CREDENTIAL_KEY, api_key.trim())
}
