//! Key/value persistence for the signed-in user, shaped after browser local
//! storage: string keys, string values, one entry per key.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use shared::domain::Session;
use tracing::{debug, warn};

use crate::error::SessionStoreError;

pub const SESSION_STORAGE_KEY: &str = "currentUser";
pub const STORAGE_FILE_NAME: &str = "local_storage.json";

pub trait SessionStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError>;
    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError>;
}

/// Reads the persisted session. Anything missing, unreadable or malformed
/// yields `None`; callers treat that as an anonymous visitor.
pub fn load_session(store: &dyn SessionStore) -> Option<Session> {
    let raw = match store.get_item(SESSION_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            debug!("ignoring unreadable session storage: {err}");
            return None;
        }
    };
    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => Some(session),
        Err(err) => {
            debug!("ignoring malformed persisted session: {err}");
            None
        }
    }
}

pub fn save_session(store: &dyn SessionStore, session: &Session) -> Result<(), SessionStoreError> {
    let raw = serde_json::to_string(session)?;
    store.set_item(SESSION_STORAGE_KEY, &raw)
}

pub fn clear_session(store: &dyn SessionStore) -> Result<(), SessionStoreError> {
    store.remove_item(SESSION_STORAGE_KEY)
}

/// JSON object on disk mapping keys to string values.
pub struct FileSessionStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    /// Store file inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(STORAGE_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionStoreError {
        SessionStoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read_items(&self) -> Result<BTreeMap<String, String>, SessionStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn write_items(&self, items: &BTreeMap<String, String>) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| self.io_error(err))?;
        }
        let raw = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).map_err(|err| self.io_error(err))?;
        fs::rename(&tmp, &self.path).map_err(|err| self.io_error(err))
    }

    // A corrupt file must not block writing a fresh session over it.
    fn read_items_for_update(&self) -> Result<BTreeMap<String, String>, SessionStoreError> {
        match self.read_items() {
            Err(SessionStoreError::Json(err)) => {
                warn!(
                    path = %self.path.display(),
                    "replacing malformed storage file: {err}"
                );
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let _lock = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let _lock = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_items_for_update()?;
        items.insert(key.to_string(), value.to_string());
        self.write_items(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError> {
        let _lock = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let mut items = self.read_items_for_update()?;
        if items.remove(key).is_none() && !self.path.exists() {
            return Ok(());
        }
        self.write_items(&items)
    }
}

/// Process-local store; nothing survives a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    items: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, SessionStoreError> {
        let items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionStoreError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionStoreError> {
        let mut items = self.items.lock().unwrap_or_else(|e| e.into_inner());
        items.remove(key);
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/session_store_tests.rs"]
mod tests;
