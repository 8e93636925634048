use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;

use super::KeyValueStore;

/// Durable store persisted as a flat JSON object on disk.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so a crash leaves either the old or the new contents. The in-memory
/// map only takes a change once it is on disk.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, anyhow::Error> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read storage file {}", path.display()))?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw).with_context(|| {
                    format!("Storage file {} is not a JSON object", path.display())
                })?
            }
        } else {
            BTreeMap::new()
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened durable storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), anyhow::Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create storage directory {}", parent.display())
                })?;
            }
        }

        let body = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, body)
            .with_context(|| format!("Failed to write storage file {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace storage file {}", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("File store mutex poisoned: {}", e))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("File store mutex poisoned: {}", e))?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| anyhow::anyhow!("File store mutex poisoned: {}", e))?;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
