//! LRU Table Module
//!
//! Ordered key/value table with O(1) recency updates.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::cache::CacheEntry;

// == LRU Table ==
/// Key/value storage ordered by access time.
///
/// Entries live in an arena and are threaded into a doubly linked list where:
/// - Front (`head`) = Most recently used
/// - Back (`tail`) = Least recently used
///
/// The table enforces no capacity; callers decide when to evict.
#[derive(Debug)]
pub struct LruTable<K, V> {
    /// Key to arena slot
    index: HashMap<K, usize, RandomState>,
    /// Entry arena, `None` marks a free slot
    slots: Vec<Option<CacheEntry<K, V>>>,
    /// Recycled arena slots
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K, V> Default for LruTable<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::with_hasher(RandomState::new()),
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K, V> LruTable<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns the value for `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.move_to_front(idx);
        self.slots[idx].as_ref().map(|entry| &entry.value)
    }

    // == Peek ==
    /// Returns the value for `key` without touching its recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.slots[idx].as_ref().map(|entry| &entry.value)
    }

    // == Touch ==
    /// Marks an existing key as most recently used.
    ///
    /// Returns false if the key is not present.
    pub fn touch(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&idx) => {
                self.move_to_front(idx);
                true
            }
            None => false,
        }
    }

    // == Push Front ==
    /// Inserts a key at the most recently used position.
    ///
    /// An existing key is only refreshed and keeps its value. Returns true if
    /// a new entry was inserted.
    pub fn push_front(&mut self, key: K, value: V) -> bool {
        if self.touch(&key) {
            return false;
        }

        let idx = self.alloc(CacheEntry::new(key.clone(), value));
        self.link_front(idx);
        self.index.insert(key, idx);
        true
    }

    // == Pop Back ==
    /// Removes and returns the least recently used entry.
    ///
    /// Returns None if the table is empty.
    pub fn pop_back(&mut self) -> Option<(K, V)> {
        let idx = self.tail?;
        self.unlink(idx);
        let entry = self.release(idx)?;
        self.index.remove(&entry.key);
        Some(entry.into_pair())
    }

    // == Remove ==
    /// Removes a key from the table, returning its value.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        self.release(idx).map(|entry| entry.value)
    }

    // == Contains ==
    /// Checks if a key is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    // == Length ==
    /// Returns the number of stored entries.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    // == Keys ==
    /// Returns keys ordered from least to most recently used.
    pub fn keys(&self) -> Vec<K> {
        let mut keys = Vec::with_capacity(self.len());
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            match &self.slots[idx] {
                Some(entry) => {
                    keys.push(entry.key.clone());
                    cursor = entry.prev;
                }
                None => break,
            }
        }
        keys
    }

    // == Clear ==
    /// Drops every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    fn alloc(&mut self, entry: CacheEntry<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, idx: usize) -> Option<CacheEntry<K, V>> {
        let entry = self.slots[idx].take();
        if entry.is_some() {
            self.free.push(idx);
        }
        entry
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        if let Some(entry) = self.slots[idx].as_mut() {
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(head_idx) => {
                if let Some(head) = self.slots[head_idx].as_mut() {
                    head.prev = Some(idx);
                }
            }
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_mut() {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_entry) = self.slots[prev_idx].as_mut() {
                    prev_entry.next = next;
                }
            }
            None => self.head = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_entry) = self.slots[next_idx].as_mut() {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }
}
