//! Session Storage - Persistence layer for the session
//!
//! The session is three string entries (`token`, `role`, `userId`) that
//! outlive the process. Stores are plain key/value maps so a browser-style
//! local store and a file on disk look the same to the manager.

use crate::{ApplicationError, ApplicationResult};
use ddrp_core::{DdrpError, ErrorContext};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Durable key/value storage for session entries
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> ApplicationResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> ApplicationResult<()>;

    /// Removing an absent key is not an error
    fn remove(&self, key: &str) -> ApplicationResult<()>;
}

/// Process-local store, used by tests and embedders without a disk
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ApplicationResult<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> ApplicationResult<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// JSON file store
///
/// The file is re-read on every access so a second process sharing the
/// file sees logouts and logins made by the first.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> ApplicationResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content =
            std::fs::read_to_string(&self.path).map_err(|e| self.failure("read", e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        match serde_json::from_str(&content) {
            Ok(map) => Ok(map),
            Err(e) => {
                // Unreadable session is treated as no session
                warn!(
                    "Ignoring corrupt session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> ApplicationResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| self.failure("create_dir", e))?;
            }
        }

        let json_data =
            serde_json::to_string_pretty(map).map_err(|e| self.failure("serialize", e))?;

        // Write then rename so readers never see a half-written file
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json_data).map_err(|e| self.failure("write", e))?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.failure("rename", e))?;

        debug!("Saved session entries to {}", self.path.display());
        Ok(())
    }

    fn failure<E>(&self, operation: &str, source: E) -> ApplicationError
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        DdrpError::Storage {
            message: format!("Session file {} failed", operation),
            source: Some(Box::new(source)),
            context: ErrorContext::new("session_storage")
                .with_operation(operation)
                .with_metadata("path", &self.path.display().to_string())
                .with_suggestion("Check that the session file location is writable"),
        }
        .into()
    }

    fn update<F>(&self, apply: F) -> ApplicationResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.read_map()?;
        apply(&mut map);
        self.write_map(&map)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> ApplicationResult<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> ApplicationResult<()> {
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> ApplicationResult<()> {
        if !self.path.exists() {
            return Ok(());
        }
        self.update(|map| {
            map.remove(key);
        })
    }
}
