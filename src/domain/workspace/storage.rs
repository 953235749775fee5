//! Key-value storage backends for persisted workspace layouts.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::WorkspaceError;

/// String key-value store the workspace persists into.
pub trait Storage {
    /// Raw value for `key`, or `None` when nothing has been stored.
    fn load(&self, key: &str) -> Result<Option<String>, WorkspaceError>;

    fn store(&mut self, key: &str, value: &str) -> Result<(), WorkspaceError>;

    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), WorkspaceError>;
}

/// In-process storage, mostly for tests and ephemeral sessions.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, WorkspaceError> {
        Ok(self.entries.get(key).cloned())
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), WorkspaceError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), WorkspaceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, WorkspaceError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&mut self, key: &str, value: &str) -> Result<(), WorkspaceError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        // Write-then-rename so a crash never leaves a half-written layout.
        let path = self.path(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), WorkspaceError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
