use crate::clock::{Clock, SystemClock};
use crate::config::FrecencyConfig;
use crate::scoring::{frecency_score, is_valid_half_life, DEFAULT_HALF_LIFE_DAYS};
use crate::Result;
use recall_store::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Usage history for one item key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UsageRecord {
    /// Epoch milliseconds of the most recent use
    pub last_used_at: i64,
    pub usage_count: u64,
}

/// An item together with the score it was ranked by
#[derive(Debug, Clone)]
pub struct ScoredItem<T> {
    pub item: T,
    pub score: f64,
}

/// Orders items so the ones used often *and* recently come first
///
/// Usage is persisted per key in the given store, so rankings carry over
/// between runs. Keys come from the caller; prefer a stable id over a display
/// name, since renaming an item would otherwise orphan its history.
pub struct FrecencySorter {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    half_life_days: f64,
}

impl FrecencySorter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            half_life_days: DEFAULT_HALF_LIFE_DAYS,
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &FrecencyConfig) -> Self {
        Self::new(store).with_half_life_days(config.half_life_days)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Override the half-life. Values that aren't positive and finite are
    /// ignored, keeping the current half-life.
    pub fn with_half_life_days(mut self, days: f64) -> Self {
        if is_valid_half_life(days) {
            self.half_life_days = days;
        } else {
            warn!(
                "Ignoring invalid half-life of {} days, keeping {}",
                days, self.half_life_days
            );
        }
        self
    }

    pub fn half_life_days(&self) -> f64 {
        self.half_life_days
    }

    fn now_millis(&self) -> i64 {
        self.clock.now().timestamp_millis()
    }

    /// Stored record for `key`, if there is a readable one
    pub async fn usage(&self, key: &str) -> Result<Option<UsageRecord>> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!("Ignoring unreadable usage record for {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Note that `key` was just used
    pub async fn record_usage(&self, key: &str) -> Result<UsageRecord> {
        let mut record = self.usage(key).await?.unwrap_or_default();
        record.last_used_at = self.now_millis();
        record.usage_count = record.usage_count.saturating_add(1);

        self.store.set(key, &serde_json::to_string(&record)?).await?;
        debug!("Recorded use #{} of {}", record.usage_count, key);
        Ok(record)
    }

    /// Forget everything about `key`
    pub async fn reset(&self, key: &str) -> Result<()> {
        self.store.remove(key).await?;
        debug!("Reset usage of {}", key);
        Ok(())
    }

    /// Forget every key in this sorter's store, returning how many went
    pub async fn reset_all(&self) -> Result<usize> {
        let keys = self.store.keys().await?;
        for key in &keys {
            self.store.remove(key).await?;
        }
        debug!("Reset usage of {} keys", keys.len());
        Ok(keys.len())
    }

    pub async fn score(&self, key: &str) -> Result<f64> {
        let record = self.usage(key).await?;
        Ok(self.score_record(record.as_ref(), self.now_millis()))
    }

    fn score_record(&self, record: Option<&UsageRecord>, now_millis: i64) -> f64 {
        frecency_score(
            record.map(|r| r.last_used_at),
            record.map(|r| r.usage_count),
            now_millis,
            self.half_life_days,
        )
    }

    /// Score every item, highest first
    ///
    /// Equal scores keep their input order, so anything never used stays
    /// where the caller put it, below everything that was.
    pub async fn rank<T, F>(&self, items: Vec<T>, key_of: F) -> Result<Vec<ScoredItem<T>>>
    where
        F: Fn(&T) -> &str,
    {
        let now = self.now_millis();
        let mut scored = Vec::with_capacity(items.len());

        for item in items {
            let record = self.usage(key_of(&item)).await?;
            let score = self.score_record(record.as_ref(), now);
            scored.push(ScoredItem { item, score });
        }

        // sort_by is stable, which is what keeps ties in input order
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(scored)
    }

    /// Like [`FrecencySorter::rank`] without the scores
    pub async fn sort<T, F>(&self, items: Vec<T>, key_of: F) -> Result<Vec<T>>
    where
        F: Fn(&T) -> &str,
    {
        let ranked = self.rank(items, key_of).await?;
        Ok(ranked.into_iter().map(|scored| scored.item).collect())
    }
}
