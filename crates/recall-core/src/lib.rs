// Expiring cache and frecency ranking on top of a key-value store
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod frecency;
pub mod scoring;

pub use cache::{CacheEntry, ExpiringCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::Error;
pub use frecency::{FrecencySorter, ScoredItem, UsageRecord};
pub use recall_store::{KeyValueStore, MemoryStore, SqliteStore, StoreError};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
