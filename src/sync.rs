//! Thread-safe wrapper around [`CachedFactory`].
//!
//! The cache itself is single-threaded. [`ConcurrentCachedFactory`] puts it
//! behind one `parking_lot::Mutex` and serialises every call, which keeps the
//! pool/registry invariant intact across threads. Products are reached with
//! closures run under the lock ([`with_object`](ConcurrentCachedFactory::with_object)).
//!
//! Creators are `Send` but not `Sync`, so the lock is a `Mutex` rather than an
//! `RwLock`.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use cachedfactory::prelude::*;
//!
//! let cache: ConcurrentCachedFactory<u8, (), Vec<u8>> =
//!     ConcurrentCachedFactory::new(CachedFactory::new());
//! cache.register(0, |()| Vec::with_capacity(16));
//! let cache = Arc::new(cache);
//!
//! let workers: Vec<_> = (0..4)
//!     .map(|i| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             let handle = cache.create_object(0, ()).unwrap();
//!             cache.with_object_mut(&handle, |buf| buf.push(i));
//!             cache.release_object(handle).unwrap();
//!         })
//!     })
//!     .collect();
//! for worker in workers {
//!     worker.join().unwrap();
//! }
//! assert_eq!(cache.out_count(), 0);
//! ```

use std::fmt;

use parking_lot::{Mutex, MutexGuard};

use crate::cache::CachedFactory;
use crate::error::{InvariantError, Result};
use crate::handle::RawPointer;
use crate::key::Params;
use crate::metrics::snapshot::StatisticsSnapshot;
use crate::metrics::NoStatistics;
use crate::policy::creation::AlwaysCreate;
use crate::policy::random::EvictRandom;
use crate::traits::{CreationPolicy, Encapsulation, EvictionPolicy, StatisticsPolicy};

/// [`CachedFactory`] shared between threads.
pub struct ConcurrentCachedFactory<
    Id,
    P,
    T,
    C = AlwaysCreate,
    E = EvictRandom,
    S = NoStatistics,
    N = RawPointer,
> where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    inner: Mutex<CachedFactory<Id, P, T, C, E, S, N>>,
}

impl<Id, P, T, C, E, S, N> ConcurrentCachedFactory<Id, P, T, C, E, S, N>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    pub fn new(cache: CachedFactory<Id, P, T, C, E, S, N>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    pub fn into_inner(self) -> CachedFactory<Id, P, T, C, E, S, N> {
        self.inner.into_inner()
    }

    /// Locks the cache for a sequence of operations that must not interleave
    /// with other threads.
    pub fn lock(&self) -> MutexGuard<'_, CachedFactory<Id, P, T, C, E, S, N>> {
        self.inner.lock()
    }

    pub fn register<F>(&self, id: Id, creator: F) -> bool
    where
        F: FnMut(P) -> T + Send + 'static,
    {
        self.inner.lock().register(id, creator)
    }

    pub fn unregister(&self, id: &Id) -> bool {
        self.inner.lock().unregister(id)
    }

    pub fn is_registered(&self, id: &Id) -> bool {
        self.inner.lock().is_registered(id)
    }

    /// See [`CachedFactory::create_object`].
    pub fn create_object(&self, id: Id, params: P) -> Result<N::Handle> {
        self.inner.lock().create_object(id, params)
    }

    /// Like [`create_object`](Self::create_object) but gives up instead of
    /// blocking when another thread holds the lock.
    pub fn try_create_object(&self, id: Id, params: P) -> Option<Result<N::Handle>> {
        let mut cache = self.inner.try_lock()?;
        Some(cache.create_object(id, params))
    }

    /// See [`CachedFactory::release_object`].
    pub fn release_object(&self, handle: N::Handle) -> Result<()> {
        self.inner.lock().release_object(handle)
    }

    /// Runs `f` on the product behind `handle`; `None` if the handle is not
    /// checked out from this cache.
    pub fn with_object<R>(&self, handle: &N::Handle, f: impl FnOnce(&T) -> R) -> Option<R> {
        let cache = self.inner.lock();
        cache.get(handle).map(f)
    }

    pub fn with_object_mut<R>(
        &self,
        handle: &N::Handle,
        f: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let mut cache = self.inner.lock();
        cache.get_mut(handle).map(f)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn idle_count(&self) -> usize {
        self.inner.lock().idle_count()
    }

    pub fn out_count(&self) -> usize {
        self.inner.lock().out_count()
    }

    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        self.inner.lock().statistics()
    }

    pub fn report(&self) -> String {
        self.inner.lock().report()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }
}

impl<Id, P, T, C, E, S, N> From<CachedFactory<Id, P, T, C, E, S, N>>
    for ConcurrentCachedFactory<Id, P, T, C, E, S, N>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    fn from(cache: CachedFactory<Id, P, T, C, E, S, N>) -> Self {
        Self::new(cache)
    }
}

impl<Id, P, T, C, E, S, N> fmt::Debug for ConcurrentCachedFactory<Id, P, T, C, E, S, N>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(cache) => f
                .debug_struct("ConcurrentCachedFactory")
                .field("inner", &*cache)
                .finish(),
            None => f
                .debug_struct("ConcurrentCachedFactory")
                .field("inner", &"<locked>")
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::SimpleStatistics;
    use crate::policy::creation::AmountLimitedCreation;
    use crate::policy::lru::EvictLru;

    #[test]
    fn is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ConcurrentCachedFactory<u8, (u32,), String>>();
    }

    #[test]
    fn single_thread_round_trip() {
        let cache: ConcurrentCachedFactory<&str, (), String> = CachedFactory::new().into();
        cache.register("a", |()| "a".to_string());
        let handle = cache.create_object("a", ()).unwrap();
        assert_eq!(cache.with_object(&handle, |s| s.len()), Some(1));
        cache.with_object_mut(&handle, |s| s.push('!'));
        cache.release_object(handle).unwrap();

        let again = cache.create_object("a", ()).unwrap();
        assert_eq!(cache.with_object(&again, String::clone), Some("a!".to_string()));
        cache.check_invariants().unwrap();
    }

    #[test]
    fn try_create_gives_up_while_locked() {
        let cache: ConcurrentCachedFactory<u8, (), u8> = CachedFactory::new().into();
        cache.register(0, |()| 0);
        let guard = cache.lock();
        assert!(cache.try_create_object(0, ()).is_none());
        drop(guard);
        assert!(cache.try_create_object(0, ()).unwrap().is_ok());
    }

    #[test]
    fn lock_allows_compound_operations() {
        let cache = ConcurrentCachedFactory::new(CachedFactory::with_policies(
            AmountLimitedCreation::try_new(2).unwrap(),
            EvictLru::new(),
            SimpleStatistics::new(),
        ));
        cache.register(0u8, |(n,): (u8,)| n);
        {
            let mut guard = cache.lock();
            let first = guard.create_object(0, (1,)).unwrap();
            guard.creation_policy_mut().set_max_creation(3).unwrap();
            guard.release_object(first).unwrap();
        }
        assert_eq!(cache.statistics().unwrap().created, 1);
        assert!(format!("{:?}", cache).contains("live: 1"));
        assert_eq!(cache.into_inner().len(), 1);
    }
}
