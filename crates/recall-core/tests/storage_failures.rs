use async_trait::async_trait;
use mockall::mock;
use recall_core::{Error, ExpiringCache, FrecencySorter, KeyValueStore, StoreError};
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Store {}

    #[async_trait]
    impl KeyValueStore for Store {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
        async fn remove(&self, key: &str) -> Result<(), StoreError>;
        async fn keys(&self) -> Result<Vec<String>, StoreError>;
    }
}

fn offline() -> StoreError {
    StoreError::Unavailable("disk went away".to_string())
}

fn unreadable_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_get().returning(|_| Err(offline()));
    store.expect_set().never();
    store
}

fn read_only_store() -> MockStore {
    let mut store = MockStore::new();
    store.expect_get().returning(|_| Ok(None));
    store.expect_set().returning(|_, _| Err(offline()));
    store
}

#[tokio::test]
async fn test_cache_get_propagates_read_failure() {
    let cache = ExpiringCache::new(Arc::new(unreadable_store()), Duration::from_secs(300));

    let result = cache.get::<String>("k").await;
    assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));
}

#[tokio::test]
async fn test_cache_set_propagates_write_failure() {
    let cache = ExpiringCache::new(Arc::new(read_only_store()), Duration::from_secs(300));

    let result = cache.set("k", &"v").await;
    assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));
}

#[tokio::test]
async fn test_cache_corrupt_entry_never_touches_write_path() {
    let mut store = MockStore::new();
    store
        .expect_get()
        .returning(|_| Ok(Some("<html>oops</html>".to_string())));
    store.expect_remove().never();
    store.expect_set().never();

    let cache = ExpiringCache::new(Arc::new(store), Duration::from_secs(300));
    assert_eq!(cache.get::<String>("k").await.unwrap(), None);
}

#[tokio::test]
async fn test_record_usage_propagates_read_failure() {
    let sorter = FrecencySorter::new(Arc::new(unreadable_store()));

    let result = sorter.record_usage("k").await;
    assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));
}

#[tokio::test]
async fn test_record_usage_propagates_write_failure() {
    let sorter = FrecencySorter::new(Arc::new(read_only_store()));

    let result = sorter.record_usage("k").await;
    assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));
}

#[tokio::test]
async fn test_sort_fails_as_a_whole() {
    let sorter = FrecencySorter::new(Arc::new(unreadable_store()));

    let result = sorter
        .sort(vec!["a".to_string(), "b".to_string()], |s| s.as_str())
        .await;
    assert!(result.is_err());
}
