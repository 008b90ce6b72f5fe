//! Keyed LRU - A thread-safe bounded LRU store with per-key locking
//!
//! Provides an LRU store with hit/miss accounting, a key-scoped lock
//! registry, and a memoizing wrapper built on the store's get/put contract.

pub mod cache;
pub mod config;
pub mod error;
pub mod lock;
pub mod memo;

pub use cache::{CacheObject, CacheStats, LruStore, LruStoreBuilder};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use lock::{AsyncKeyGuard, AsyncKeyLock, KeyGuard, KeyLock};
pub use memo::{cached, cached_with, CallKey, Cached, Kwargs, Memoized};
