//! Client-side key-value storage.
//!
//! The dashboard keeps its bearer token and cached profile in two stores that
//! differ only in retention: a durable store that survives restarts and a
//! tab-scoped store that lives as long as the process.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

/// Key holding the bearer token (same name in both stores).
pub const TOKEN_KEY: &str = "token";

/// Older token keys that are still cleared on logout.
pub const LEGACY_TOKEN_KEYS: &[&str] = &["authToken", "refreshToken"];

/// Key holding the JSON-encoded profile projection.
pub const USER_DATA_KEY: &str = "userData";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error>;
    fn remove(&self, key: &str) -> Result<(), anyhow::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageArea {
    Durable,
    Session,
}

/// The pair of stores a session reads from and writes to.
#[derive(Clone)]
pub struct ClientStorage {
    durable: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
}

impl ClientStorage {
    pub fn new(durable: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, session }
    }

    /// Both stores held in memory. Used by tests and ephemeral deployments.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn area(&self, area: StorageArea) -> &dyn KeyValueStore {
        match area {
            StorageArea::Durable => self.durable.as_ref(),
            StorageArea::Session => self.session.as_ref(),
        }
    }

    pub fn durable(&self) -> &dyn KeyValueStore {
        self.durable.as_ref()
    }

    pub fn session(&self) -> &dyn KeyValueStore {
        self.session.as_ref()
    }

    /// Remove `key` from both stores.
    pub fn remove_everywhere(&self, key: &str) -> Result<(), anyhow::Error> {
        self.durable.remove(key)?;
        self.session.remove(key)?;
        Ok(())
    }
}
