//! Lock Registry Module
//!
//! Maps keys to reference-counted lock primitives, creating them on demand
//! and reclaiming them once the last user lets go.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use ahash::RandomState;
use parking_lot::Mutex;
use tracing::debug;

// == Slot ==
struct Slot<M> {
    primitive: Arc<M>,
    /// Holders plus waiters currently leasing this primitive
    users: usize,
}

// == Lock Registry ==
/// Registry of one primitive `M` per distinct key.
///
/// The registry mutex is only held while a slot is fetched, created or
/// reclaimed, never while a caller waits on or holds the primitive itself.
pub(crate) struct LockRegistry<K: Hash + Eq, M> {
    slots: Mutex<HashMap<K, Slot<M>, RandomState>>,
}

impl<K: Hash + Eq, M> Default for LockRegistry<K, M> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::with_hasher(RandomState::new())),
        }
    }
}

impl<K, M> LockRegistry<K, M>
where
    K: Hash + Eq + Clone,
    M: Default,
{
    // == Lease ==
    /// Fetches or creates the primitive for `key` and registers one user.
    ///
    /// Creation happens under the registry lock, so equal keys can never end
    /// up with two live primitives.
    pub(crate) fn lease(&self, key: K) -> Lease<'_, K, M> {
        let mut slots = self.slots.lock();
        let primitive = match slots.get_mut(&key) {
            Some(slot) => {
                slot.users += 1;
                Arc::clone(&slot.primitive)
            }
            None => {
                let primitive = Arc::new(M::default());
                slots.insert(
                    key.clone(),
                    Slot {
                        primitive: Arc::clone(&primitive),
                        users: 1,
                    },
                );
                debug!(registered = slots.len(), "created keyed lock");
                primitive
            }
        };

        Lease {
            registry: self,
            key,
            primitive,
        }
    }

    fn release(&self, key: &K) {
        let mut slots = self.slots.lock();
        let idle = match slots.get_mut(key) {
            Some(slot) => {
                slot.users = slot.users.saturating_sub(1);
                slot.users == 0
            }
            None => false,
        };
        if idle {
            slots.remove(key);
            debug!(registered = slots.len(), "reclaimed idle keyed lock");
        }
    }
}

impl<K: Hash + Eq, M> LockRegistry<K, M> {
    /// Number of keys with a live primitive.
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }
}

// == Lease ==
/// One registered use of a keyed primitive; unregisters itself on drop.
pub(crate) struct Lease<'a, K, M>
where
    K: Hash + Eq + Clone,
    M: Default,
{
    registry: &'a LockRegistry<K, M>,
    key: K,
    primitive: Arc<M>,
}

impl<K, M> Lease<'_, K, M>
where
    K: Hash + Eq + Clone,
    M: Default,
{
    pub(crate) fn key(&self) -> &K {
        &self.key
    }

    pub(crate) fn primitive(&self) -> &Arc<M> {
        &self.primitive
    }
}

impl<K, M> Drop for Lease<'_, K, M>
where
    K: Hash + Eq + Clone,
    M: Default,
{
    fn drop(&mut self) {
        self.registry.release(&self.key);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    type Registry = LockRegistry<&'static str, Mutex<()>>;

    #[test]
    fn test_registry_equal_keys_share_primitive() {
        let registry = Registry::default();

        let first = registry.lease("a");
        let second = registry.lease("a");

        assert!(Arc::ptr_eq(first.primitive(), second.primitive()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_distinct_keys_get_distinct_primitives() {
        let registry = Registry::default();

        let a = registry.lease("a");
        let b = registry.lease("b");

        assert!(!Arc::ptr_eq(a.primitive(), b.primitive()));
        assert_eq!(a.key(), &"a");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_registry_reclaims_after_last_lease() {
        let registry = Registry::default();

        let first = registry.lease("a");
        let second = registry.lease("a");
        drop(first);
        assert_eq!(registry.len(), 1);

        drop(second);
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_registry_recreates_after_reclaim() {
        let registry = Registry::default();

        let old = Arc::clone(registry.lease("a").primitive());
        let fresh = registry.lease("a");

        assert!(!Arc::ptr_eq(&old, fresh.primitive()));
        assert_eq!(registry.len(), 1);
    }
}
