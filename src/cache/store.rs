//! Cache Store Module
//!
//! Thread-safe LRU store combining the recency table with per-handle counters.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::stats::Counters;
use crate::cache::{CacheObject, CacheStats, LruTable};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

type SharedTable<K, V> = Arc<Mutex<LruTable<K, V>>>;

// == LRU Store ==
/// Bounded key/value store with least-recently-used eviction.
///
/// A `maxsize` of zero means unbounded. Every operation holds the table lock
/// for its whole duration, so lookups never race with evictions.
///
/// Two stores may alias one table (see [`LruStoreBuilder::share`]); each
/// handle keeps its own counters and capacity.
pub struct LruStore<K, V> {
    /// Backing table, possibly shared with other handles
    table: SharedTable<K, V>,
    /// Maximum number of entries, 0 = unbounded
    maxsize: usize,
    /// Value handed out by `get_or_sentinel` on a miss
    sentinel: Option<V>,
    counters: Counters,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store. Non-positive `maxsize` means unbounded.
    pub fn new(maxsize: i64) -> Self {
        Self::from_parts(Arc::new(Mutex::new(LruTable::new())), normalize(maxsize), None)
    }

    /// Creates an empty store that never evicts.
    pub fn unbounded() -> Self {
        Self::new(0)
    }

    /// Creates an empty store sized from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.maxsize)
    }

    /// Starts building a store with an initial mapping, sentinel or shared table.
    pub fn builder() -> LruStoreBuilder<K, V> {
        LruStoreBuilder::default()
    }

    fn from_parts(table: SharedTable<K, V>, maxsize: usize, sentinel: Option<V>) -> Self {
        debug!(maxsize, "LRU store created");
        Self {
            table,
            maxsize,
            sentinel,
            counters: Counters::default(),
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit refreshes the key to most recently used and counts one hit.
    /// A miss counts one miss and leaves the table unchanged.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut table = self.table.lock();
        match table.get(key) {
            Some(value) => {
                self.counters.record_hit();
                Some(value.clone())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Get Or Sentinel ==
    /// Like [`LruStore::get`], but substitutes the configured sentinel on a miss.
    ///
    /// Returns None on a miss only when no sentinel was configured.
    pub fn get_or_sentinel(&self, key: &K) -> Option<V> {
        self.get(key).or_else(|| self.sentinel.clone())
    }

    // == Put ==
    /// Stores a key-value pair.
    ///
    /// An existing key is only refreshed to most recently used; its value is
    /// kept. Callers that need to replace a value remove it first. A new key
    /// that pushes the table over capacity evicts the least recently used
    /// entry.
    pub fn put(&self, key: K, value: V) {
        let mut table = self.table.lock();
        if !table.push_front(key, value) || self.maxsize == 0 {
            return;
        }
        // A shared table may have been grown by a larger handle
        while table.len() > self.maxsize {
            if table.pop_back().is_none() {
                break;
            }
            self.counters.record_eviction();
            debug!(maxsize = self.maxsize, len = table.len(), "evicted least recently used entry");
        }
    }

    // == Remove ==
    /// Removes an entry by key, returning its value.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.table.lock().remove(key)
    }

    // == Peek ==
    /// Returns a value without touching recency or counters.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.table.lock().peek(key).cloned()
    }

    // == Contains ==
    /// Checks for a key without touching recency or counters.
    pub fn contains(&self, key: &K) -> bool {
        self.table.lock().contains(key)
    }

    // == Keys ==
    /// Returns keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        self.table.lock().keys()
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&self) {
        self.table.lock().clear();
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    // == Full ==
    /// Returns true when bounded and at or over capacity.
    pub fn full(&self) -> bool {
        self.maxsize > 0 && self.len() >= self.maxsize
    }

    /// Returns the capacity, 0 meaning unbounded.
    pub fn maxsize(&self) -> usize {
        self.maxsize
    }

    /// Returns the configured sentinel, if any.
    pub fn sentinel(&self) -> Option<&V> {
        self.sentinel.as_ref()
    }

    /// Number of hits recorded by this handle.
    pub fn hits(&self) -> u64 {
        self.counters.hits()
    }

    /// Number of misses recorded by this handle.
    pub fn misses(&self) -> u64 {
        self.counters.misses()
    }

    // == Stats ==
    /// Returns current statistics for this handle.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot(self.len())
    }

    /// Returns true if both handles alias the same table.
    pub fn shares_table_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.table, &other.table)
    }
}

impl<K, V> CacheObject<K, V> for LruStore<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn get(&self, key: &K) -> Option<V> {
        LruStore::get(self, key)
    }

    fn put(&self, key: K, value: V) {
        LruStore::put(self, key, value)
    }
}

impl<K, V> fmt::Debug for LruStore<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruStore")
            .field("maxsize", &self.maxsize)
            .field("hits", &self.counters.hits())
            .field("misses", &self.counters.misses())
            .finish_non_exhaustive()
    }
}

fn normalize(maxsize: i64) -> usize {
    if maxsize <= 0 {
        0
    } else {
        usize::try_from(maxsize).unwrap_or(usize::MAX)
    }
}

// == Builder ==
enum Initial<K, V> {
    Empty,
    Entries(Vec<(K, V)>),
    Shared(SharedTable<K, V>),
}

/// Builder for [`LruStore`] construction options.
pub struct LruStoreBuilder<K, V> {
    maxsize: i64,
    initial: Initial<K, V>,
    sentinel: Option<V>,
}

impl<K, V> Default for LruStoreBuilder<K, V> {
    fn default() -> Self {
        Self {
            maxsize: 0,
            initial: Initial::Empty,
            sentinel: None,
        }
    }
}

impl<K, V> LruStoreBuilder<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Sets the capacity. Non-positive means unbounded.
    pub fn maxsize(mut self, maxsize: i64) -> Self {
        self.maxsize = maxsize;
        self
    }

    /// Copies an initial mapping into a fresh table.
    ///
    /// Entries are inserted in iteration order, so the first one becomes the
    /// least recently used. A repeated key only refreshes the earlier entry.
    pub fn initial<I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        self.initial = Initial::Entries(entries.into_iter().collect());
        self
    }

    /// Aliases the table of an existing store instead of copying it.
    pub fn share(mut self, other: &LruStore<K, V>) -> Self {
        self.initial = Initial::Shared(Arc::clone(&other.table));
        self
    }

    /// Sets the value returned by `get_or_sentinel` on a miss.
    pub fn sentinel(mut self, sentinel: V) -> Self {
        self.sentinel = Some(sentinel);
        self
    }

    /// Builds the store.
    ///
    /// # Errors
    /// Returns [`CacheError::Configuration`] if the initial mapping holds more
    /// entries than a positive `maxsize`.
    pub fn build(self) -> Result<LruStore<K, V>> {
        let maxsize = normalize(self.maxsize);

        let table = match self.initial {
            Initial::Empty => Arc::new(Mutex::new(LruTable::new())),
            Initial::Entries(entries) => {
                let mut table = LruTable::new();
                for (key, value) in entries {
                    table.push_front(key, value);
                }
                Arc::new(Mutex::new(table))
            }
            Initial::Shared(table) => table,
        };

        let len = table.lock().len();
        if maxsize > 0 && len > maxsize {
            return Err(CacheError::Configuration(format!(
                "initial cache holds {} entries, larger than maxsize {}",
                len, maxsize
            )));
        }

        Ok(LruStore::from_parts(table, maxsize, self.sentinel))
    }
}
