use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::Result;
use recall_store::KeyValueStore;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// What actually gets written to the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub value: T,
    /// Epoch seconds. At or past this instant the entry is gone.
    pub expires_at: i64,
}

impl<T> CacheEntry<T> {
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs >= self.expires_at
    }
}

/// TTL cache over a store that knows nothing about expiry
///
/// Expired entries are evicted lazily: the first `get` that notices removes
/// them. Nothing runs in the background. Use [`ExpiringCache::prune`] to sweep
/// on demand.
///
/// Build one per namespace and hand it to whoever needs it.
pub struct ExpiringCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl ExpiringCache {
    pub fn new(store: Arc<dyn KeyValueStore>, default_ttl: Duration) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            default_ttl,
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &CacheConfig) -> Self {
        Self::new(store, Duration::from_secs(config.default_ttl_seconds))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn now_secs(&self) -> i64 {
        self.clock.now().timestamp()
    }

    /// Store `value` under `key` with the default TTL
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Store `value` under `key`, replacing anything already there
    ///
    /// Expiry is tracked in whole seconds; a partial second rounds up.
    pub async fn set_with_ttl<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        let whole_secs = ttl.as_secs().saturating_add(u64::from(ttl.subsec_nanos() > 0));
        let ttl_secs = i64::try_from(whole_secs).unwrap_or(i64::MAX);
        let entry = CacheEntry {
            value,
            expires_at: self.now_secs().saturating_add(ttl_secs),
        };

        let raw = serde_json::to_string(&entry)?;
        self.store.set(key, &raw).await?;
        debug!("Cached {} for {}s", key, ttl_secs);
        Ok(())
    }

    /// Fetch a live value
    ///
    /// Missing, expired and unreadable entries all come back as `None`.
    /// Only a failing store produces an error.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key).await? else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        let entry: CacheEntry<serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Unreadable cache entry {}: {}", key, e);
                return Ok(None);
            }
        };

        if entry.is_expired_at(self.now_secs()) {
            debug!("Evicting expired cache entry {}", key);
            self.store.remove(key).await?;
            return Ok(None);
        }

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Ok(Some(value))
            }
            Err(e) => {
                debug!("Cache entry {} has unexpected shape: {}", key, e);
                Ok(None)
            }
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key).await?;
        Ok(())
    }

    /// Return the cached value, or run `fetch`, cache its result and return it
    ///
    /// If `fetch` fails nothing is written and the error is returned as-is.
    pub async fn get_or_insert_with<T, F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = fetch().await?;
        self.set_with_ttl(key, &value, ttl).await?;
        Ok(value)
    }

    /// Remove every expired entry, returning how many went
    ///
    /// Keys holding something that isn't a cache entry are left alone.
    pub async fn prune(&self) -> Result<usize> {
        let now = self.now_secs();
        let mut removed = 0;

        for key in self.store.keys().await? {
            let Some(raw) = self.store.get(&key).await? else {
                continue;
            };

            let Ok(entry) = serde_json::from_str::<CacheEntry<IgnoredAny>>(&raw) else {
                continue;
            };

            if entry.is_expired_at(now) {
                self.store.remove(&key).await?;
                removed += 1;
            }
        }

        debug!("Pruned {} expired cache entries", removed);
        Ok(removed)
    }
}
