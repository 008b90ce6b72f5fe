//! Cache Entry Module
//!
//! Defines the arena node that holds one key/value pair and its recency links.

// == Cache Entry ==
/// A single (key, value) pair stored in the recency list.
///
/// `prev` points towards the most recently used end, `next` towards the least
/// recently used end. Links are indices into the owning table's arena.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
    /// The lookup key
    pub key: K,
    /// The stored value, opaque to the cache
    pub value: V,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

impl<K, V> CacheEntry<K, V> {
    // == Constructor ==
    /// Creates an unlinked entry.
    pub fn new(key: K, value: V) -> Self {
        Self {
            key,
            value,
            prev: None,
            next: None,
        }
    }

    #[cfg(test)]
    fn is_linked(&self) -> bool {
        self.prev.is_some() || self.next.is_some()
    }

    // == Into Pair ==
    /// Consumes the entry, returning the key and value.
    pub fn into_pair(self) -> (K, V) {
        (self.key, self.value)
    }
}
