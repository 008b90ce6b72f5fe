//! Configuration Module
//!
//! Handles loading store and workload settings from environment variables.

use std::env;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{CacheError, Result};

/// Store and workload configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries the store can hold (<= 0 means unbounded)
    pub maxsize: i64,
    /// Number of concurrent workers in the workload driver
    pub workers: usize,
    /// Number of distinct keys contended by the workers
    pub keys: usize,
    /// Increments each worker performs per key
    pub rounds: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// Unparsable values fall back to their defaults.
    ///
    /// # Environment Variables
    /// - `LRU_MAXSIZE` - Store capacity, <= 0 for unbounded (default: 128)
    /// - `WORKLOAD_WORKERS` - Concurrent workers (default: 8)
    /// - `WORKLOAD_KEYS` - Distinct keys (default: 16)
    /// - `WORKLOAD_ROUNDS` - Increments per worker and key (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            maxsize: env::var("LRU_MAXSIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.maxsize),
            workers: env::var("WORKLOAD_WORKERS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.workers),
            keys: env::var("WORKLOAD_KEYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.keys),
            rounds: env::var("WORKLOAD_ROUNDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rounds),
        }
    }

    /// Strict variant of [`CacheConfig::from_env`].
    ///
    /// Missing variables still use defaults, but a present value that fails
    /// to parse is reported as [`CacheError::Configuration`].
    pub fn try_from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            maxsize: parse_var("LRU_MAXSIZE", defaults.maxsize)?,
            workers: parse_var("WORKLOAD_WORKERS", defaults.workers)?,
            keys: parse_var("WORKLOAD_KEYS", defaults.keys)?,
            rounds: parse_var("WORKLOAD_ROUNDS", defaults.rounds)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| {
            CacheError::Configuration(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maxsize: 128,
            workers: 8,
            keys: 16,
            rounds: 100,
        }
    }
}
