//! Configuration Module
//!
//! Handles loading cache sizing parameters from environment variables.
//! The listening port is the single required command-line argument and is
//! parsed separately in `main`.

use std::env;

use crate::cache::{MAX_CACHE_SIZE, MAX_OBJECT_SIZE};

/// Proxy configuration parameters.
///
/// Size limits can be overridden via environment variables; both default to
/// the classic web-proxy limits (1 MiB cache, 100 KiB per object).
#[derive(Debug, Clone)]
pub struct Config {
    /// Total byte capacity of the object cache
    pub cache_capacity: usize,
    /// Largest response body eligible for caching, in bytes
    pub max_object_size: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Cache capacity in bytes (default: 1048576)
    /// - `MAX_OBJECT_SIZE` - Per-object ceiling in bytes (default: 102400)
    pub fn from_env() -> Self {
        Self {
            cache_capacity: env::var("CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_CACHE_SIZE),
            max_object_size: env::var("MAX_OBJECT_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_OBJECT_SIZE),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: MAX_CACHE_SIZE,
            max_object_size: MAX_OBJECT_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_capacity, 1024 * 1024);
        assert_eq!(config.max_object_size, 100 * 1024);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("CACHE_CAPACITY");
        env::remove_var("MAX_OBJECT_SIZE");

        let config = Config::from_env();
        assert_eq!(config.cache_capacity, MAX_CACHE_SIZE);
        assert_eq!(config.max_object_size, MAX_OBJECT_SIZE);
    }
}
