//! Keyed Lock Module
//!
//! Blocking per-key mutual exclusion for threads.

use std::fmt;
use std::hash::Hash;

use parking_lot::{ArcMutexGuard, Mutex, RawMutex};

use crate::lock::registry::{Lease, LockRegistry};

// == Key Lock ==
/// Serializes threads that present equal keys while letting distinct keys
/// proceed in parallel.
///
/// # Example
/// ```
/// use keyed_lru::KeyLock;
///
/// let locks = KeyLock::new();
/// {
///     let _guard = locks.acquire("user:42");
///     // critical section for user:42
/// }
/// assert!(locks.is_empty());
/// ```
pub struct KeyLock<K: Hash + Eq> {
    registry: LockRegistry<K, Mutex<()>>,
}

impl<K: Hash + Eq> Default for KeyLock<K> {
    fn default() -> Self {
        Self {
            registry: LockRegistry::default(),
        }
    }
}

impl<K> KeyLock<K>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Acquire ==
    /// Blocks until the lock for `key` is held.
    ///
    /// The returned guard releases the lock on drop, including during unwinding.
    /// Waiters on the same key are woken in no particular order.
    pub fn acquire(&self, key: K) -> KeyGuard<'_, K> {
        let lease = self.registry.lease(key);
        let guard = lease.primitive().lock_arc();
        KeyGuard {
            _guard: guard,
            lease,
        }
    }

    // == Try Acquire ==
    /// Takes the lock for `key` only if nobody holds it right now.
    pub fn try_acquire(&self, key: K) -> Option<KeyGuard<'_, K>> {
        let lease = self.registry.lease(key);
        let guard = lease.primitive().try_lock_arc()?;
        Some(KeyGuard {
            _guard: guard,
            lease,
        })
    }

    /// Number of keys currently held or waited on.
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Hash + Eq> fmt::Debug for KeyLock<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyLock")
            .field("registered", &self.registry.len())
            .finish()
    }
}

// == Key Guard ==
/// Proof that the lock for one key is held.
///
/// Field order matters: the primitive is unlocked before the lease is
/// returned to the registry.
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct KeyGuard<'a, K>
where
    K: Hash + Eq + Clone,
{
    _guard: ArcMutexGuard<RawMutex, ()>,
    lease: Lease<'a, K, Mutex<()>>,
}

impl<K> KeyGuard<'_, K>
where
    K: Hash + Eq + Clone,
{
    /// The key this guard holds.
    pub fn key(&self) -> &K {
        self.lease.key()
    }
}
