//! Cache Module
//!
//! Provides a thread-safe bounded LRU store with hit/miss accounting.

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTable;
pub use stats::CacheStats;
pub use store::{LruStore, LruStoreBuilder};

// == Cache Object ==
/// The get/put contract shared by every cache the memoizer can drive.
///
/// Implementations synchronize internally, so both methods take `&self`.
pub trait CacheObject<K, V> {
    /// Returns the stored value, or None when absent.
    fn get(&self, key: &K) -> Option<V>;

    /// Stores `value` under `key`.
    fn put(&self, key: K, value: V);
}
