//! Configuration Module
//!
//! Handles loading and validating store configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, StoreError};
use crate::index::MAX_LEVEL_LIMIT;

/// Store configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Highest level a skip list node may reach
    pub max_level: usize,
    /// Maximum number of entries the recency cache can hold
    pub cache_capacity: usize,
    /// File written by `dump` and read by `load`
    pub dump_path: PathBuf,
    /// Period of the background save task
    pub save_interval: Duration,
    /// Period of the background expiry sweep
    pub cleanup_interval: Duration,
}

impl StoreConfig {
    /// Creates a new StoreConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SKIPCACHE_MAX_LEVEL` - Skip list maximum level (default: 16)
    /// - `SKIPCACHE_CACHE_CAPACITY` - Cache entries (default: 1000)
    /// - `SKIPCACHE_DUMP_PATH` - Persistence file (default: store/dumpFile)
    /// - `SKIPCACHE_SAVE_INTERVAL` - Save period in seconds (default: 60)
    /// - `SKIPCACHE_CLEANUP_INTERVAL` - Sweep period in seconds (default: 60)
    ///
    /// Unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_level: env_parse("SKIPCACHE_MAX_LEVEL").unwrap_or(defaults.max_level),
            cache_capacity: env_parse("SKIPCACHE_CACHE_CAPACITY")
                .unwrap_or(defaults.cache_capacity),
            dump_path: env::var("SKIPCACHE_DUMP_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.dump_path),
            save_interval: env_parse("SKIPCACHE_SAVE_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.save_interval),
            cleanup_interval: env_parse("SKIPCACHE_CLEANUP_INTERVAL")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_interval),
        }
    }

    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub fn with_dump_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.dump_path = path.into();
        self
    }

    pub fn with_save_interval(mut self, interval: Duration) -> Self {
        self.save_interval = interval;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    // == Validate ==
    /// Rejects values the store cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LEVEL_LIMIT).contains(&self.max_level) {
            return Err(StoreError::InvalidConfig(format!(
                "max_level must be between 1 and {}, got {}",
                MAX_LEVEL_LIMIT, self.max_level
            )));
        }
        if self.cache_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "cache_capacity must be at least 1".to_string(),
            ));
        }
        if self.save_interval.is_zero() || self.cleanup_interval.is_zero() {
            return Err(StoreError::InvalidConfig(
                "background intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_level: 16,
            cache_capacity: 1000,
            dump_path: PathBuf::from("store/dumpFile"),
            save_interval: Duration::from_secs(60),
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = StoreConfig::default();
        assert_eq!(config.max_level, 16);
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.dump_path, PathBuf::from("store/dumpFile"));
        assert_eq!(config.save_interval, Duration::from_secs(60));
        assert_eq!(config.cleanup_interval, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests.
        env::remove_var("SKIPCACHE_MAX_LEVEL");
        env::remove_var("SKIPCACHE_CACHE_CAPACITY");
        env::remove_var("SKIPCACHE_DUMP_PATH");
        env::remove_var("SKIPCACHE_SAVE_INTERVAL");
        env::remove_var("SKIPCACHE_CLEANUP_INTERVAL");
        assert_eq!(StoreConfig::from_env(), StoreConfig::default());

        env::set_var("SKIPCACHE_MAX_LEVEL", "8");
        env::set_var("SKIPCACHE_CACHE_CAPACITY", "not-a-number");
        env::set_var("SKIPCACHE_SAVE_INTERVAL", "5");
        let config = StoreConfig::from_env();
        assert_eq!(config.max_level, 8);
        assert_eq!(config.cache_capacity, 1000);
        assert_eq!(config.save_interval, Duration::from_secs(5));

        env::remove_var("SKIPCACHE_MAX_LEVEL");
        env::remove_var("SKIPCACHE_CACHE_CAPACITY");
        env::remove_var("SKIPCACHE_SAVE_INTERVAL");
    }

    #[test]
    fn test_builder_chaining() {
        let config = StoreConfig::default()
            .with_max_level(4)
            .with_cache_capacity(3)
            .with_dump_path("/tmp/dump")
            .with_save_interval(Duration::from_secs(1))
            .with_cleanup_interval(Duration::from_secs(2));

        assert_eq!(config.max_level, 4);
        assert_eq!(config.cache_capacity, 3);
        assert_eq!(config.dump_path, PathBuf::from("/tmp/dump"));
        assert_eq!(config.cleanup_interval, Duration::from_secs(2));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = StoreConfig::default();
        assert!(base.clone().with_max_level(0).validate().is_err());
        assert!(base.clone().with_max_level(MAX_LEVEL_LIMIT + 1).validate().is_err());
        assert!(base.clone().with_cache_capacity(0).validate().is_err());
        assert!(matches!(
            base.with_save_interval(Duration::ZERO).validate(),
            Err(StoreError::InvalidConfig(_))
        ));
    }
}
