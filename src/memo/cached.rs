//! Memoizing Wrapper Module
//!
//! Wraps a function so repeated calls with equal arguments are served from a
//! cache instead of recomputed.

use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::trace;

use crate::cache::{CacheObject, LruStore};
use crate::error::Result;
use crate::memo::key::{make_key, CallKey, Kwargs};

/// Default store type backing a wrapper built by [`cached`].
pub type DefaultStore<A, W, R> = LruStore<CallKey<A, W>, R>;

// == Store Source ==
/// Marker for wrappers that get a fresh unbounded store each.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreshStore;

// == Cached ==
/// Decorator factory produced by [`cached`] or [`cached_with`].
#[derive(Debug, Clone)]
pub struct Cached<S = FreshStore> {
    source: S,
}

/// Returns a decorator that gives every wrapped function its own unbounded store.
pub fn cached() -> Cached<FreshStore> {
    Cached {
        source: FreshStore,
    }
}

/// Returns a decorator backed by `store`, shared by every function it wraps.
pub fn cached_with<C>(store: C) -> Cached<Arc<C>> {
    Cached::with_shared(Arc::new(store))
}

impl<C> Cached<Arc<C>> {
    /// Like [`cached_with`], for a store the caller keeps a handle to.
    pub fn with_shared(store: Arc<C>) -> Self {
        Self { source: store }
    }

    /// Wraps `func`, consulting the shared store on every call.
    pub fn wrap<A, W, R, F>(&self, func: F) -> Memoized<F, C, A, W, R>
    where
        F: Fn(&A, &Kwargs<W>) -> R,
        C: CacheObject<CallKey<A, W>, R>,
    {
        Memoized::new(func, Arc::clone(&self.source))
    }
}

impl Cached<FreshStore> {
    /// Wraps `func` with a store owned by the returned wrapper alone.
    pub fn wrap<A, W, R, F>(&self, func: F) -> Memoized<F, DefaultStore<A, W, R>, A, W, R>
    where
        F: Fn(&A, &Kwargs<W>) -> R,
        A: Hash + Eq + Clone,
        W: Hash + Eq + Clone,
        R: Clone,
    {
        Memoized::new(func, Arc::new(LruStore::unbounded()))
    }

    /// Wraps a function that takes positional arguments only.
    pub fn wrap_positional<A, R, F>(
        &self,
        func: F,
    ) -> Memoized<impl Fn(&A, &Kwargs<()>) -> R, DefaultStore<A, (), R>, A, (), R>
    where
        F: Fn(&A) -> R,
        A: Hash + Eq + Clone,
        R: Clone,
    {
        self.wrap(move |args: &A, _: &Kwargs<()>| func(args))
    }
}

// == Memoized ==
/// A function paired with the cache that remembers its results.
///
/// `func` should be deterministic; nothing here checks it. Two threads missing
/// on the same key at once may both compute, and the first result stored wins.
pub struct Memoized<F, C, A, W, R> {
    func: F,
    store: Arc<C>,
    _call: PhantomData<fn(A, W) -> R>,
}

impl<F, C, A, W, R> Memoized<F, C, A, W, R>
where
    F: Fn(&A, &Kwargs<W>) -> R,
    C: CacheObject<CallKey<A, W>, R>,
{
    fn new(func: F, store: Arc<C>) -> Self {
        Self {
            func,
            store,
            _call: PhantomData,
        }
    }

    // == Call ==
    /// Calls with positional arguments only.
    pub fn call(&self, args: A) -> R
    where
        R: Clone,
    {
        self.lookup_or_compute(CallKey::positional(args), &Kwargs::new())
    }

    // == Call With ==
    /// Calls with positional and keyword arguments.
    ///
    /// # Errors
    /// Returns [`crate::CacheError::InvalidArgument`] for an empty or repeated
    /// keyword name. The function is not invoked in that case.
    pub fn call_with(&self, args: A, kwargs: &Kwargs<W>) -> Result<R>
    where
        W: Clone,
        R: Clone,
    {
        let key = make_key(args, kwargs)?;
        Ok(self.lookup_or_compute(key, kwargs))
    }

    /// The cache backing this wrapper.
    pub fn store(&self) -> &C {
        &self.store
    }

    fn lookup_or_compute(&self, key: CallKey<A, W>, kwargs: &Kwargs<W>) -> R
    where
        R: Clone,
    {
        if let Some(value) = self.store.get(&key) {
            trace!("memoized call hit");
            return value;
        }

        trace!("memoized call miss");
        let value = (self.func)(key.args(), kwargs);
        self.store.put(key, value.clone());
        value
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::CacheError;

    #[test]
    fn test_memoized_second_call_is_hit() {
        let calls = AtomicUsize::new(0);
        let square = cached().wrap_positional(|x: &u64| {
            calls.fetch_add(1, Ordering::SeqCst);
            x * x
        });

        assert_eq!(square.call(12), 144);
        assert_eq!(square.call(12), 144);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(square.store().hits(), 1);
        assert_eq!(square.store().misses(), 1);
    }

    #[test]
    fn test_memoized_matches_plain_function() {
        let add = |args: &(i32, i32), kwargs: &Kwargs<i32>| {
            args.0 + args.1 + kwargs.get("bias").copied().unwrap_or(0)
        };
        let memo = cached().wrap(add);

        for a in -3..3 {
            for b in -3..3 {
                assert_eq!(memo.call((a, b)), add(&(a, b), &Kwargs::new()));
                let kwargs = Kwargs::new().arg("bias", 10);
                assert_eq!(memo.call_with((a, b), &kwargs).unwrap(), add(&(a, b), &kwargs));
            }
        }
    }

    #[test]
    fn test_memoized_keyword_order_hits_same_entry() {
        let calls = AtomicUsize::new(0);
        let memo = cached().wrap(|_: &(), kwargs: &Kwargs<i32>| {
            calls.fetch_add(1, Ordering::SeqCst);
            kwargs.iter().map(|(_, v)| *v).sum::<i32>()
        });

        let first = memo
            .call_with((), &Kwargs::new().arg("a", 1).arg("b", 2))
            .unwrap();
        let second = memo
            .call_with((), &Kwargs::new().arg("b", 2).arg("a", 1))
            .unwrap();

        assert_eq!(first, 3);
        assert_eq!(second, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memoized_invalid_keyword_skips_call() {
        let calls = AtomicUsize::new(0);
        let memo = cached().wrap(|_: &(), _: &Kwargs<i32>| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        let result = memo.call_with((), &Kwargs::new().arg("a", 1).arg("a", 1));
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_default_store_is_per_wrapper() {
        let decorator = cached();
        let double = decorator.wrap_positional(|x: &i32| x * 2);
        let triple = decorator.wrap_positional(|x: &i32| x * 3);

        assert_eq!(double.call(5), 10);
        assert_eq!(triple.call(5), 15);
        assert_eq!(double.store().len(), 1);
        assert_eq!(triple.store().len(), 1);
        assert!(!double.store().shares_table_with(triple.store()));
    }

    #[test]
    fn test_explicit_store_is_shared_and_bounded() {
        let store = Arc::new(LruStore::new(2));
        let decorator = Cached::with_shared(Arc::clone(&store));
        let memo = decorator.wrap(|x: &u32, _: &Kwargs<()>| x + 1);

        memo.call(1);
        memo.call(2);
        memo.call(3);

        assert_eq!(store.len(), 2);
        assert!(!store.contains(&CallKey::positional(1)));
        assert_eq!(store.peek(&CallKey::positional(3)), Some(4));
    }

    #[test]
    fn test_cached_with_owned_store() {
        let memo = cached_with(LruStore::new(0)).wrap(|s: &String, _: &Kwargs<()>| s.len());
        assert_eq!(memo.call("four".to_string()), 4);
        assert_eq!(memo.call("four".to_string()), 4);
        assert_eq!(memo.store().hits(), 1);
    }
}
