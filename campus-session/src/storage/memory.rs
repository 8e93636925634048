use dashmap::DashMap;

use super::KeyValueStore;

/// Process-lifetime store, the tab-scoped half of [`super::ClientStorage`].
#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, anyhow::Error> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), anyhow::Error> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), anyhow::Error> {
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("token", "abc").unwrap();
        store.set("token", "def").unwrap();
        assert_eq!(store.get("token").unwrap().as_deref(), Some("def"));
        assert_eq!(store.len(), 1);

        store.remove("token").unwrap();
        store.remove("missing").unwrap();
        assert_eq!(store.get("token").unwrap(), None);
    }
}
