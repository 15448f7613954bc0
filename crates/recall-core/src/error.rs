use recall_store::StoreError;
use thiserror::Error;

/// All the ways a cache or usage operation can fail
///
/// Note what is *not* here: expired or corrupt cache entries. Those are plain
/// misses and never show up as errors.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
