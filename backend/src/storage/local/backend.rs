//! Key-value backends for the local store.
//!
//! A backend is a flat string-to-string map, the same shape as a browser's
//! local storage. The in-memory backend is used by tests and as a
//! throwaway session store; the file backend keeps one `<key>.json` file
//! per key inside the data directory.

use anyhow::{anyhow, Context, Result};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Synchronous string storage addressed by key
pub trait KeyValueBackend: Send + Sync {
    /// Read the value stored under `key`, `None` if nothing was stored
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-local backend backed by a `HashMap`
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory backend lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// FileBackend stores each key as a JSON file in a base directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    base_directory: PathBuf,
}

impl FileBackend {
    /// Create a new file backend, creating the base directory if needed
    pub fn new<P: AsRef<Path>>(base_directory: P) -> Result<Self> {
        let base_path = base_directory.as_ref().to_path_buf();

        if !base_path.exists() {
            fs::create_dir_all(&base_path).with_context(|| {
                format!("Failed to create data directory {}", base_path.display())
            })?;
            info!("Created data directory: {}", base_path.display());
        }

        Ok(Self {
            base_directory: base_path,
        })
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    /// Get the file path used for a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.base_directory.join(format!("{}.json", file_name))
    }
}

impl KeyValueBackend for FileBackend {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!("No local data file for key {}", key);
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);

        // Atomic write using temp file
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, value)
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}
