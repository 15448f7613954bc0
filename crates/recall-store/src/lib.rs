// Persistent key-value storage
// Everything above this crate only ever sees strings in and strings out

pub mod error;
pub mod memory;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// A string key-value store with durable semantics
///
/// This is the only thing the cache and the frecency sorter need from their
/// host. Implementations must be safe to share between tasks.
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` if the key was never written or was removed
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing whatever was there
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// All keys currently present
    async fn keys(&self) -> Result<Vec<String>>;
}
