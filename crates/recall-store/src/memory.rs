use crate::{KeyValueStore, Result, StoreError};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// In-process store, gone when the process exits
///
/// Handy for tests and for callers that only want per-run caching.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        // A poisoned map still holds its entries
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("memory store lock poisoned: {}", e)))
    }
}

#[async_trait::async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_basics() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        store.set("x", "1").await.unwrap();
        store.set("y", "2").await.unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("x").await.unwrap(), Some("1".to_string()));
        assert_eq!(store.keys().await.unwrap(), vec!["x", "y"]);

        store.remove("x").await.unwrap();
        assert_eq!(store.get("x").await.unwrap(), None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_len_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryStore::new());
        store.set("kept", "1").await.unwrap();

        let poisoner = std::sync::Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.entries.lock().unwrap();
            panic!("poison the lock");
        })
        .join();

        assert!(store.entries.is_poisoned());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        assert!(matches!(store.get("kept").await, Err(StoreError::Unavailable(_))));
    }
}
