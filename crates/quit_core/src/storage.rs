use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::Result;

/// Key/value persistence the store writes its serialized state through.
pub trait StorageAdapter: Send + Sync {
    /// `Ok(None)` when nothing was stored under `key` yet.
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, contents: &str) -> Result<()>;
}

impl<T: StorageAdapter + ?Sized> StorageAdapter for Arc<T> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        (**self).save(key, contents)
    }
}

/// Stores each key as `<key>.json` inside one directory.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageAdapter for JsonFileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored state yet");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, contents)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(self, key: impl Into<String>, contents: impl Into<String>) -> Self {
        self.entries.write().insert(key.into(), contents.into());
        self
    }

    pub fn contents(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

impl StorageAdapter for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.contents(key))
    }

    fn save(&self, key: &str, contents: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }
}
