use crate::scoring::is_valid_half_life;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Loaded from `<config dir>/recall/config.toml`. Every field has a default,
/// so a missing file (or a file with only some sections) is fine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub frecency: FrecencyConfig,
}

impl Config {
    /// Load config from default location, or defaults if there isn't one
    pub fn load() -> crate::Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    pub fn load_from(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            // No config file? Use defaults
            Ok(Self::default())
        }
    }

    /// Reject values the cache or sorter can't work with
    pub fn validate(&self) -> crate::Result<()> {
        if !is_valid_half_life(self.frecency.half_life_days) {
            return Err(crate::Error::ConfigError(format!(
                "frecency.half_life_days must be a positive number, got {}",
                self.frecency.half_life_days
            )));
        }
        Ok(())
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        self.save_to(Self::config_path()?)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Where the database lives: the configured path, or the data dir default
    pub fn store_path(&self) -> crate::Result<PathBuf> {
        match &self.store.path {
            Some(path) => Ok(path.clone()),
            None => Ok(dirs::data_dir()
                .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
                .join("recall")
                .join("store.db")),
        }
    }

    /// Uses XDG on Linux, Application Support on macOS, AppData on Windows
    fn config_path() -> crate::Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("recall")
            .join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Database file. Defaults to `<data dir>/recall/store.db`
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied by `set` when the caller doesn't pick one
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: u64,

    #[serde(default = "default_cache_namespace")]
    pub namespace: String,
}

fn default_ttl_seconds() -> u64 {
    300 // five minutes is fresh enough for interactive lookups
}

fn default_cache_namespace() -> String {
    "cache".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_seconds: default_ttl_seconds(),
            namespace: default_cache_namespace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrecencyConfig {
    /// Days until a use counts half as much
    #[serde(default = "default_half_life_days")]
    pub half_life_days: f64,

    #[serde(default = "default_frecency_namespace")]
    pub namespace: String,
}

fn default_half_life_days() -> f64 {
    7.0
}

fn default_frecency_namespace() -> String {
    "frecency".to_string()
}

impl Default for FrecencyConfig {
    fn default() -> Self {
        Self {
            half_life_days: default_half_life_days(),
            namespace: default_frecency_namespace(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cache.default_ttl_seconds, 300);
        assert_eq!(config.cache.namespace, "cache");
        assert_eq!(config.frecency.half_life_days, 7.0);
        assert_eq!(config.frecency.namespace, "frecency");
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        assert!(toml.contains("default_ttl_seconds"));
        assert!(toml.contains("half_life_days"));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[cache]\ndefault_ttl_seconds = 60\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache.default_ttl_seconds, 60);
        assert_eq!(config.cache.namespace, "cache");
        assert_eq!(config.frecency.half_life_days, 7.0);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.cache.default_ttl_seconds, 300);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sub").join("config.toml");

        let mut config = Config::default();
        config.frecency.half_life_days = 3.5;
        config.store.path = Some(dir.path().join("db.sqlite"));
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.frecency.half_life_days, 3.5);
        assert_eq!(loaded.store_path().unwrap(), dir.path().join("db.sqlite"));
    }

    #[test]
    fn test_bad_half_life_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        for bad in ["0.0", "-7.0", "nan", "inf"] {
            std::fs::write(&path, format!("[frecency]\nhalf_life_days = {}\n", bad)).unwrap();
            assert!(
                matches!(Config::load_from(&path), Err(crate::Error::ConfigError(_))),
                "half_life_days = {} was accepted",
                bad
            );
        }
    }

    #[test]
    fn test_garbage_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        assert!(matches!(
            Config::load_from(&path),
            Err(crate::Error::ConfigError(_))
        ));
    }
}
