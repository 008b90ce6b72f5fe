//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check capacity, recency and accounting against a simple model.

use proptest::prelude::*;
use std::collections::VecDeque;

use crate::cache::LruStore;

// == Test Configuration ==
const TEST_MAXSIZE: usize = 8;

// == Strategies ==
/// Generates keys from a small domain so that hits and refreshes are common
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..24
}

#[derive(Debug, Clone)]
enum CacheOp {
    Put { key: u8, value: u32 },
    Get { key: u8 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Put { key, value }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
    ]
}

// == Reference Model ==
/// Naive LRU: front = least recently used.
struct Model {
    order: VecDeque<(u8, u32)>,
    maxsize: usize,
}

impl Model {
    fn new(maxsize: usize) -> Self {
        Self {
            order: VecDeque::new(),
            maxsize,
        }
    }

    fn get(&mut self, key: u8) -> Option<u32> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        let entry = self.order.remove(pos)?;
        self.order.push_back(entry);
        Some(entry.1)
    }

    fn put(&mut self, key: u8, value: u32) {
        if let Some(pos) = self.order.iter().position(|(k, _)| *k == key) {
            if let Some(entry) = self.order.remove(pos) {
                self.order.push_back(entry);
            }
            return;
        }
        self.order.push_back((key, value));
        if self.maxsize > 0 && self.order.len() > self.maxsize {
            self.order.pop_front();
        }
    }

    fn keys(&self) -> Vec<u8> {
        self.order.iter().map(|(k, _)| *k).collect()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Any sequence of operations leaves the store in the same state as the model.
    #[test]
    fn prop_matches_reference_model(ops in prop::collection::vec(cache_op_strategy(), 1..200)) {
        let store = LruStore::new(TEST_MAXSIZE as i64);
        let mut model = Model::new(TEST_MAXSIZE);

        for op in ops {
            match op {
                CacheOp::Put { key, value } => {
                    store.put(key, value);
                    model.put(key, value);
                }
                CacheOp::Get { key } => {
                    prop_assert_eq!(store.get(&key), model.get(key));
                }
            }
        }

        prop_assert_eq!(store.keys(), model.keys());
    }

    // Hits and misses account for every get and nothing else.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..100)) {
        let store = LruStore::new(TEST_MAXSIZE as i64);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Put { key, value } => store.put(key, value),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.total_entries, store.len(), "Total entries mismatch");
    }

    // Distinct puts settle at exactly maxsize entries, keeping the newest ones.
    #[test]
    fn prop_capacity_enforcement(count in (TEST_MAXSIZE + 1)..100usize) {
        let store = LruStore::new(TEST_MAXSIZE as i64);

        for i in 0..count {
            store.put(i, i);
            prop_assert!(store.len() <= TEST_MAXSIZE);
        }

        prop_assert_eq!(store.len(), TEST_MAXSIZE);
        let expected: Vec<usize> = (count - TEST_MAXSIZE..count).collect();
        prop_assert_eq!(store.keys(), expected);
    }

    // Re-putting a key never changes its value or the entry count.
    #[test]
    fn prop_idempotent_refresh(
        key in key_strategy(),
        first in any::<u32>(),
        later in prop::collection::vec(any::<u32>(), 1..10)
    ) {
        let store = LruStore::new(TEST_MAXSIZE as i64);
        store.put(key, first);

        for value in later {
            store.put(key, value);
            prop_assert_eq!(store.len(), 1);
        }

        prop_assert_eq!(store.peek(&key), Some(first));
        prop_assert_eq!(store.hits(), 0);
        prop_assert_eq!(store.misses(), 0);
    }
}
