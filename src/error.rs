//! Error types for the cache, lock and memoization layers
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the crate.
///
/// Misses and full stores are not errors: `get` reports absence through
/// `Option`, and `put` restores capacity by evicting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Store or environment configuration is inconsistent
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A memoized call was given malformed arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

// == Result Type Alias ==
/// Convenience Result type for the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
