//! Async Keyed Lock Module
//!
//! Per-key mutual exclusion for tokio tasks.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::lock::registry::{Lease, LockRegistry};

// == Async Key Lock ==
/// Task-aware counterpart of [`crate::KeyLock`].
///
/// Waiting does not block the executor thread. Dropping an `acquire` future
/// before it resolves gives its registration back to the registry.
pub struct AsyncKeyLock<K: Hash + Eq> {
    registry: LockRegistry<K, Mutex<()>>,
}

impl<K: Hash + Eq> Default for AsyncKeyLock<K> {
    fn default() -> Self {
        Self {
            registry: LockRegistry::default(),
        }
    }
}

impl<K> AsyncKeyLock<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    // == Acquire ==
    /// Waits until the lock for `key` is held.
    ///
    /// Tokio's mutex wakes waiters in FIFO order, but callers should not rely
    /// on any ordering.
    pub async fn acquire(&self, key: K) -> AsyncKeyGuard<'_, K> {
        let lease = self.registry.lease(key);
        let guard = Arc::clone(lease.primitive()).lock_owned().await;
        AsyncKeyGuard {
            _guard: guard,
            lease,
        }
    }

    // == Try Acquire ==
    /// Takes the lock for `key` only if nobody holds it right now.
    pub fn try_acquire(&self, key: K) -> Option<AsyncKeyGuard<'_, K>> {
        let lease = self.registry.lease(key);
        let guard = Arc::clone(lease.primitive()).try_lock_owned().ok()?;
        Some(AsyncKeyGuard {
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

impl<K: Hash + Eq> fmt::Debug for AsyncKeyLock<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncKeyLock")
            .field("registered", &self.registry.len())
            .finish()
    }
}

// == Async Key Guard ==
/// Proof that the async lock for one key is held. Unlocks on drop.
#[must_use = "the key is unlocked as soon as the guard is dropped"]
pub struct AsyncKeyGuard<'a, K>
where
    K: Hash + Eq + Clone,
{
    _guard: OwnedMutexGuard<()>,
    lease: Lease<'a, K, Mutex<()>>,
}

impl<K> AsyncKeyGuard<'_, K>
where
    K: Hash + Eq + Clone,
{
    /// The key this guard holds.
    pub fn key(&self) -> &K {
        self.lease.key()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_async_acquire_and_release() {
        let locks = AsyncKeyLock::new();

        let guard = locks.acquire("a").await;
        assert_eq!(guard.key(), &"a");
        assert!(locks.try_acquire("a").is_none());
        assert!(locks.try_acquire("b").is_some());

        drop(guard);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_async_cancelled_waiter_is_unregistered() {
        let locks = AsyncKeyLock::new();
        let guard = locks.acquire("a").await;

        // The waiter cannot get the lock and is dropped by the timeout
        let waited = tokio::time::timeout(Duration::from_millis(20), locks.acquire("a")).await;
        assert!(waited.is_err());
        assert_eq!(locks.len(), 1);

        drop(guard);
        assert!(locks.is_empty());
    }

    #[test]
    fn test_async_acquire_with_block_on() {
        let locks = AsyncKeyLock::new();
        let key = tokio_test::block_on(async {
            let guard = locks.acquire(7u32).await;
            *guard.key()
        });
        assert_eq!(key, 7);
        assert!(locks.is_empty());
    }
}
