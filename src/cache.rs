//! The cached factory: a policy-configured object pool in front of a
//! [`Factory`].
//!
//! ## Architecture
//!
//! ```text
//!   create_object(id, params)
//!        │
//!        ▼
//!   Key(id, params) ──► idle pool ──hit──────────────────────────────┐
//!                    BTreeMap<Key, Vec<ObjectId>>   (LIFO per key)   │
//!                         │ miss                                     │
//!                         ▼                                          │
//!                  creation.can_create()                             │
//!                    │ Ok(true)      │ Ok(false)         │ Err       │
//!                    │               ▼                   └──► caller │
//!                    │     eviction.select_victim(is_idle)           │
//!                    │               │                               │
//!                    │         remove(victim)                        │
//!                    ▼               ▼                               │
//!                  factory.create(id, params) ── on_create hooks     │
//!                                    │                               │
//!                                    ▼                               ▼
//!                            on_fetch hooks ── checked-out registry ──► handle
//!
//!   release_object(handle)
//!        │
//!        ▼
//!   checked-out registry ──absent──► NotOwned
//!        │ present
//!        ▼
//!   on_release hooks ──► push onto idle pool under the recorded key
//! ```
//!
//! ## Ownership
//!
//! Every product lives in one table owned by the cache, keyed by
//! [`ObjectId`]. The idle pool and the checked-out registry only hold
//! identities; they are disjoint and together cover every live product.
//! [`check_invariants`](CachedFactory::check_invariants) verifies this.
//!
//! ## Example Usage
//!
//! ```
//! use cachedfactory::CachedFactory;
//!
//! let mut cache: CachedFactory<&str, (usize,), Vec<u8>> = CachedFactory::new();
//! cache.register("buffer", |(size,)| vec![0; size]);
//!
//! let first = cache.create_object("buffer", (64,)).unwrap();
//! let first_id = first.id();
//! cache.get_mut(&first).unwrap()[0] = 1;
//! cache.release_object(first).unwrap();
//!
//! // same key: the idle buffer is handed out again
//! let again = cache.create_object("buffer", (64,)).unwrap();
//! assert_eq!(again.id(), first_id);
//! assert_eq!(cache.get(&again).unwrap()[0], 1);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use log::{debug, error, trace, warn};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{CacheError, InvariantError, Result};
use crate::factory::Factory;
use crate::handle::{ObjectId, RawPointer};
use crate::key::{Key, Params};
use crate::metrics::snapshot::StatisticsSnapshot;
use crate::metrics::NoStatistics;
use crate::policy::creation::AlwaysCreate;
use crate::policy::random::EvictRandom;
use crate::traits::{CreationPolicy, Encapsulation, EvictionPolicy, StatisticsPolicy};

/// Object cache over a [`Factory`], parameterised by its four policies.
///
/// - `C`: admission ([`CreationPolicy`])
/// - `E`: eviction ([`EvictionPolicy`])
/// - `S`: statistics ([`StatisticsPolicy`])
/// - `N`: handle encapsulation ([`Encapsulation`])
///
/// Single-threaded; wrap it in a lock to share it (see the `concurrency`
/// feature).
pub struct CachedFactory<
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
    factory: Factory<Id, P, T>,
    products: FxHashMap<ObjectId, T>,
    idle: BTreeMap<Key<Id, P>, Vec<ObjectId>>,
    checked_out: FxHashMap<ObjectId, Key<Id, P>>,
    out: usize,
    creation: C,
    eviction: E,
    statistics: S,
    encapsulation: N,
}

impl<Id, P, T> CachedFactory<Id, P, T>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
{
    /// Cache with unrestricted admission, random eviction and no statistics.
    pub fn new() -> Self {
        Self::with_policies(AlwaysCreate, EvictRandom::new(), NoStatistics)
    }
}

impl<Id, P, T> Default for CachedFactory<Id, P, T>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<Id, P, T, C, E, S> CachedFactory<Id, P, T, C, E, S, RawPointer>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
{
    /// Cache handing out [`RawHandle`](crate::handle::RawHandle)s.
    pub fn with_policies(creation: C, eviction: E, statistics: S) -> Self {
        Self::with_encapsulation(creation, eviction, statistics, RawPointer)
    }
}

impl<Id, P, T, C, E, S, N> CachedFactory<Id, P, T, C, E, S, N>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    pub fn with_encapsulation(creation: C, eviction: E, statistics: S, encapsulation: N) -> Self {
        Self {
            factory: Factory::new(),
            products: FxHashMap::default(),
            idle: BTreeMap::new(),
            checked_out: FxHashMap::default(),
            out: 0,
            creation,
            eviction,
            statistics,
            encapsulation,
        }
    }

    // ------------------------------------------------------------------
    // Factory
    // ------------------------------------------------------------------

    /// Registers a creator; `false` if `id` is already taken.
    pub fn register<F>(&mut self, id: Id, creator: F) -> bool
    where
        F: FnMut(P) -> T + Send + 'static,
    {
        self.factory.register(id, creator)
    }

    /// Removes the creator for `id`. Idle products built by it stay pooled
    /// and can still be handed out.
    pub fn unregister(&mut self, id: &Id) -> bool {
        self.factory.unregister(id)
    }

    pub fn is_registered(&self, id: &Id) -> bool {
        self.factory.is_registered(id)
    }

    pub fn registered_ids(&self) -> Vec<Id> {
        self.factory.registered_ids()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Checks out a product for `(id, params)`.
    ///
    /// The most recently released idle product with an equal key is reused.
    /// Otherwise a new one is constructed, after evicting an idle product if
    /// the creation policy asks for room.
    ///
    /// # Errors
    ///
    /// - [`CacheError::UnknownIdentifier`]: nothing registered under `id`.
    /// - [`CacheError::CreationForbidden`] / [`CacheError::CreationRateExceeded`]:
    ///   the creation policy refused outright.
    /// - [`CacheError::EvictionImpossible`]: room was needed but no idle
    ///   product qualifies.
    /// - [`CacheError::Internal`]: the bookkeeping is corrupted.
    ///
    /// On error nothing is checked out and no product is constructed.
    pub fn create_object(&mut self, id: Id, params: P) -> Result<N::Handle> {
        let key = Key::new(id, params);
        let object = match self.take_idle(&key) {
            Some(object) => {
                trace!("reusing idle object {} for {:?}", object, key.id());
                object
            },
            None => self.construct(&key)?,
        };

        self.statistics.on_fetch();
        self.eviction.on_fetch(object);
        self.out += 1;
        self.checked_out.insert(object, key);
        Ok(self.encapsulation.encapsulate(object))
    }

    /// Returns a checked-out product to the idle pool.
    ///
    /// # Errors
    ///
    /// [`CacheError::NotOwned`] if the handle is not currently checked out
    /// from this cache; the cache is left untouched.
    pub fn release_object(&mut self, handle: N::Handle) -> Result<()> {
        let object = self.encapsulation.object_id(&handle);
        let Some(key) = self.checked_out.remove(&object) else {
            debug!("release of {} refused: not checked out here", object);
            return Err(CacheError::NotOwned);
        };
        let object = self.encapsulation.release(handle);

        self.statistics.on_release();
        self.eviction.on_release(object);
        self.out -= 1;
        trace!("released {} for {:?}", object, key.id());
        self.idle.entry(key).or_default().push(object);
        Ok(())
    }

    fn take_idle(&mut self, key: &Key<Id, P>) -> Option<ObjectId> {
        let pool = self.idle.get_mut(key)?;
        let object = pool.pop();
        if pool.is_empty() {
            self.idle.remove(key);
        }
        object
    }

    fn construct(&mut self, key: &Key<Id, P>) -> Result<ObjectId> {
        if !self.factory.is_registered(key.id()) {
            return Err(CacheError::UnknownIdentifier {
                id: format!("{:?}", key.id()),
            });
        }

        if !self.creation.can_create()? {
            debug!(
                "{} creation policy asks for room, evicting with {}",
                self.creation.name(),
                self.eviction.name()
            );
            let checked_out = &self.checked_out;
            let victim = self
                .eviction
                .select_victim(&|object| !checked_out.contains_key(&object))?;
            self.remove(victim)?;
        }

        let product = self.factory.create(key.id(), key.params().clone())?;
        let object = ObjectId::next();
        self.products.insert(object, product);

        self.creation.on_create();
        self.statistics.on_create();
        self.eviction.on_create(object);
        trace!("constructed {} for {:?}", object, key.id());
        Ok(object)
    }

    /// Destroys the idle product `victim`.
    fn remove(&mut self, victim: ObjectId) -> Result<()> {
        if self.checked_out.contains_key(&victim) {
            error!("eviction nominated checked-out object {}", victim);
            return Err(InvariantError::new(format!(
                "cannot destroy checked-out object {}",
                victim
            ))
            .into());
        }

        let mut found = false;
        for pool in self.idle.values_mut() {
            if let Some(pos) = pool.iter().position(|object| *object == victim) {
                pool.remove(pos);
                found = true;
                break;
            }
        }
        if !found {
            error!("eviction nominated unknown object {}", victim);
            return Err(
                InvariantError::new(format!("object {} is not in the idle pool", victim)).into(),
            );
        }
        self.idle.retain(|_, pool| !pool.is_empty());

        self.creation.on_destroy();
        self.statistics.on_destroy();
        self.eviction.on_destroy(victim);
        self.products.remove(&victim);
        debug!("evicted {}", victim);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Access
    // ------------------------------------------------------------------

    /// Product behind `handle`, if it is checked out from this cache.
    pub fn get(&self, handle: &N::Handle) -> Option<&T> {
        let object = self.encapsulation.object_id(handle);
        if !self.checked_out.contains_key(&object) {
            return None;
        }
        self.products.get(&object)
    }

    pub fn get_mut(&mut self, handle: &N::Handle) -> Option<&mut T> {
        let object = self.encapsulation.object_id(handle);
        if !self.checked_out.contains_key(&object) {
            return None;
        }
        self.products.get_mut(&object)
    }

    /// Whether `object` is currently checked out from this cache.
    pub fn is_checked_out(&self, object: ObjectId) -> bool {
        self.checked_out.contains_key(&object)
    }

    /// Live products, idle and checked out.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn idle_count(&self) -> usize {
        self.idle.values().map(Vec::len).sum()
    }

    pub fn out_count(&self) -> usize {
        self.out
    }

    // ------------------------------------------------------------------
    // Policies
    // ------------------------------------------------------------------

    pub fn creation_policy(&self) -> &C {
        &self.creation
    }

    /// Mutable access for reconfiguring admission limits at run time.
    pub fn creation_policy_mut(&mut self) -> &mut C {
        &mut self.creation
    }

    pub fn eviction_policy(&self) -> &E {
        &self.eviction
    }

    pub fn statistics_policy(&self) -> &S {
        &self.statistics
    }

    pub fn encapsulation_policy(&self) -> &N {
        &self.encapsulation
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Current counters, if the statistics policy keeps any.
    pub fn statistics(&self) -> Option<StatisticsSnapshot> {
        self.statistics.snapshot()
    }

    /// Human-readable list of the configured policies.
    pub fn configuration(&self) -> String {
        format!(
            "############################\n\
             ## Cache configuration\n\
             ## + Encapsulation : {}\n\
             ## + Creation      : {}\n\
             ## + Eviction      : {}\n\
             ## + Statistics    : {}\n\
             ############################\n",
            self.encapsulation.name(),
            self.creation.name(),
            self.eviction.name(),
            self.statistics.name()
        )
    }

    /// [`configuration`](Self::configuration) followed by the statistics
    /// block when the statistics policy counts.
    pub fn report(&self) -> String {
        let mut report = self.configuration();
        if let Some(snapshot) = self.statistics() {
            report.push_str(&snapshot.to_string());
        }
        report
    }

    /// Verifies that the idle pool and the checked-out registry are disjoint,
    /// that together they cover exactly the live products, and that the out
    /// counter matches the registry.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let mut idle = FxHashSet::default();
        for (key, pool) in &self.idle {
            if pool.is_empty() {
                return Err(InvariantError::new(format!(
                    "empty idle sequence kept for {:?}",
                    key.id()
                )));
            }
            for object in pool {
                if !idle.insert(*object) {
                    return Err(InvariantError::new(format!(
                        "object {} pooled twice",
                        object
                    )));
                }
                if self.checked_out.contains_key(object) {
                    return Err(InvariantError::new(format!(
                        "object {} is both idle and checked out",
                        object
                    )));
                }
                if !self.products.contains_key(object) {
                    return Err(InvariantError::new(format!(
                        "idle object {} has no product",
                        object
                    )));
                }
            }
        }

        if let Some(object) = self
            .checked_out
            .keys()
            .find(|object| !self.products.contains_key(object))
        {
            return Err(InvariantError::new(format!(
                "checked-out object {} has no product",
                object
            )));
        }

        if idle.len() + self.checked_out.len() != self.products.len() {
            return Err(InvariantError::new(format!(
                "{} idle + {} out != {} live",
                idle.len(),
                self.checked_out.len(),
                self.products.len()
            )));
        }

        if self.out != self.checked_out.len() {
            return Err(InvariantError::new(format!(
                "out counter {} != {} registered",
                self.out,
                self.checked_out.len()
            )));
        }
        Ok(())
    }
}

impl<Id, P, T, C, E, S, N> fmt::Debug for CachedFactory<Id, P, T, C, E, S, N>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedFactory")
            .field("factory", &self.factory)
            .field("live", &self.products.len())
            .field("idle", &self.idle_count())
            .field("out", &self.out)
            .field("creation", &self.creation.name())
            .field("eviction", &self.eviction.name())
            .field("statistics", &self.statistics.name())
            .finish()
    }
}

/// Teardown drops every product, including the ones still checked out.
///
/// Handles still held by clients become inert identities that no cache will
/// ever resolve again. Keeping those products alive would leak them; this
/// choice is debatable and logged with `warn!` when it happens. No policy
/// hooks fire.
impl<Id, P, T, C, E, S, N> Drop for CachedFactory<Id, P, T, C, E, S, N>
where
    Id: Ord + Clone + fmt::Debug,
    P: Params,
    C: CreationPolicy,
    E: EvictionPolicy,
    S: StatisticsPolicy,
    N: Encapsulation,
{
    fn drop(&mut self) {
        if self.out > 0 {
            warn!(
                "dropping cache with {} object(s) still checked out; destroying them",
                self.out
            );
        }
        debug!("cache teardown\n{}", self.report());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::RawHandle;
    use crate::metrics::SimpleStatistics;
    use crate::policy::aging::EvictAging;
    use crate::policy::creation::{AmountLimitedCreation, NeverCreate, RateLimitedCreation};
    use crate::policy::lru::EvictLru;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    type LruCache = CachedFactory<
        &'static str,
        (),
        String,
        AmountLimitedCreation,
        EvictLru,
        SimpleStatistics,
    >;

    fn lru_cache(max_live: usize) -> LruCache {
        let mut cache = CachedFactory::with_policies(
            AmountLimitedCreation::try_new(max_live).unwrap(),
            EvictLru::new(),
            SimpleStatistics::new(),
        );
        for id in ["a", "b", "c", "d"] {
            cache.register(id, move |()| id.to_uppercase());
        }
        cache
    }

    // ==============================================
    // Reuse
    // ==============================================

    mod reuse {
        use super::*;

        #[test]
        fn round_trip_returns_same_instance() {
            let mut cache = lru_cache(4);
            let first = cache.create_object("a", ()).unwrap();
            let id = first.id();
            cache.release_object(first).unwrap();

            let second = cache.create_object("a", ()).unwrap();
            assert_eq!(second.id(), id);
            let stats = cache.statistics().unwrap();
            assert_eq!(stats.created, 1);
            assert_eq!(stats.hits, 1);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn most_recently_released_is_reused_first() {
            let mut cache = lru_cache(4);
            let x = cache.create_object("a", ()).unwrap();
            let y = cache.create_object("a", ()).unwrap();
            let y_id = y.id();
            cache.release_object(x).unwrap();
            cache.release_object(y).unwrap();

            let reused = cache.create_object("a", ()).unwrap();
            assert_eq!(reused.id(), y_id);
        }

        #[test]
        fn different_params_do_not_share_instances() {
            let mut cache: CachedFactory<u8, (u32,), u32> = CachedFactory::new();
            cache.register(0, |(n,)| n * 10);
            let ten = cache.create_object(0, (1,)).unwrap();
            let ten_id = ten.id();
            cache.release_object(ten).unwrap();

            let twenty = cache.create_object(0, (2,)).unwrap();
            assert_ne!(twenty.id(), ten_id);
            assert_eq!(cache.get(&twenty), Some(&20));
            assert_eq!(cache.len(), 2);
            assert_eq!(cache.idle_count(), 1);
        }

        #[test]
        fn zero_arity_params_struct_keys_by_value() {
            #[derive(Clone, PartialEq, Eq, PartialOrd, Ord)]
            struct Buffer {
                size: usize,
            }

            impl Params for Buffer {
                const ARITY: usize = 0;
            }

            let mut cache: CachedFactory<u8, Buffer, Vec<u8>> = CachedFactory::new();
            cache.register(0, |Buffer { size }| vec![0; size]);
            let small = cache.create_object(0, Buffer { size: 1 }).unwrap();
            cache.release_object(small).unwrap();

            let large = cache.create_object(0, Buffer { size: 1000 }).unwrap();
            assert_eq!(cache.get(&large).map(Vec::len), Some(1000));
            assert_eq!(cache.idle_count(), 1);
        }

        #[test]
        fn counter_scenario() {
            struct Counter {
                value: u32,
            }
            let mut cache: CachedFactory<u32, (), Counter, _, _, _> =
                CachedFactory::with_policies(AlwaysCreate, EvictLru::new(), SimpleStatistics::new());
            cache.register(1, |()| Counter { value: 0 });

            let first = cache.create_object(1, ()).unwrap();
            let second = cache.create_object(1, ()).unwrap();
            assert_ne!(first.id(), second.id());
            cache.get_mut(&first).unwrap().value += 1;
            let stats = cache.statistics().unwrap();
            assert_eq!(stats.created, 2);
            assert_eq!(stats.out, 2);

            let ids = [first.id(), second.id()];
            cache.release_object(first).unwrap();
            cache.release_object(second).unwrap();

            let third = cache.create_object(1, ()).unwrap();
            assert!(ids.contains(&third.id()));
            assert_eq!(cache.statistics().unwrap().created, 2);
            assert!(cache.get(&third).unwrap().value <= 1);
        }

        #[test]
        fn empty_pool_entries_are_dropped() {
            let mut cache = lru_cache(4);
            let a = cache.create_object("a", ()).unwrap();
            cache.release_object(a).unwrap();
            let _a = cache.create_object("a", ()).unwrap();
            assert_eq!(cache.idle_count(), 0);
            cache.check_invariants().unwrap();
        }
    }

    // ==============================================
    // Ownership
    // ==============================================

    mod ownership {
        use super::*;

        #[test]
        fn foreign_handle_is_not_owned() {
            let mut cache = lru_cache(4);
            let mut other = lru_cache(4);
            let mine = cache.create_object("a", ()).unwrap();
            let foreign = other.create_object("a", ()).unwrap();

            let before = cache.statistics();
            let (len, idle, out) = (cache.len(), cache.idle_count(), cache.out_count());

            assert_eq!(cache.release_object(foreign), Err(CacheError::NotOwned));
            assert_eq!(cache.statistics(), before);
            assert_eq!((cache.len(), cache.idle_count(), cache.out_count()), (len, idle, out));
            cache.check_invariants().unwrap();

            cache.release_object(mine).unwrap();
        }

        #[test]
        fn get_refuses_foreign_handles() {
            let mut cache = lru_cache(4);
            let mut other = lru_cache(4);
            let foreign = other.create_object("b", ()).unwrap();
            assert!(cache.get(&foreign).is_none());
            assert!(cache.get_mut(&foreign).is_none());
            assert_eq!(other.get(&foreign).map(String::as_str), Some("B"));
        }

        #[test]
        fn checked_out_flag_follows_lifecycle() {
            let mut cache = lru_cache(4);
            let handle = cache.create_object("c", ()).unwrap();
            let id = handle.id();
            assert!(cache.is_checked_out(id));
            cache.release_object(handle).unwrap();
            assert!(!cache.is_checked_out(id));
        }
    }

    // ==============================================
    // Eviction
    // ==============================================

    mod eviction {
        use super::*;
        use test_log::test;

        #[test]
        fn lru_evicts_first_released() {
            let mut cache = lru_cache(3);
            let handles: Vec<RawHandle> = ["a", "b", "c"]
                .into_iter()
                .map(|id| cache.create_object(id, ()).unwrap())
                .collect();
            let a_id = handles[0].id();
            for handle in handles {
                cache.release_object(handle).unwrap();
            }

            let d = cache.create_object("d", ()).unwrap();
            assert_eq!(cache.len(), 3);
            assert_eq!(cache.eviction_policy().score(a_id), None);
            assert_eq!(cache.statistics().unwrap().destroyed(), 1);
            cache.release_object(d).unwrap();

            // b and c are still pooled
            let hits_before = cache.statistics().unwrap().hits;
            let _b = cache.create_object("b", ()).unwrap();
            let _c = cache.create_object("c", ()).unwrap();
            let stats = cache.statistics().unwrap();
            assert_eq!(stats.hits, hits_before + 2);
            assert_eq!(stats.created, 4);
            cache.check_invariants().unwrap();
        }

        #[test]
        fn checked_out_instance_is_never_evicted() {
            let mut cache = lru_cache(1);
            let a = cache.create_object("a", ()).unwrap();

            assert_eq!(
                cache.create_object("b", ()).unwrap_err(),
                CacheError::EvictionImpossible
            );
            assert_eq!(cache.len(), 1);
            assert_eq!(cache.out_count(), 1);
            assert_eq!(cache.statistics().unwrap().created, 1);
            assert_eq!(cache.get(&a).map(String::as_str), Some("A"));
            cache.check_invariants().unwrap();
        }

        #[test]
        fn aging_evicts_stalest_register() {
            let mut cache: CachedFactory<&str, (), String, _, _, _> = CachedFactory::with_policies(
                AmountLimitedCreation::try_new(2).unwrap(),
                EvictAging::new(),
                SimpleStatistics::new(),
            );
            cache.register("x", |()| "x".to_string());
            cache.register("y", |()| "y".to_string());
            cache.register("z", |()| "z".to_string());

            let x = cache.create_object("x", ()).unwrap();
            let y = cache.create_object("y", ()).unwrap();
            let y_id = y.id();
            cache.release_object(y).unwrap();
            cache.release_object(x).unwrap();

            let _z = cache.create_object("z", ()).unwrap();
            assert_eq!(cache.eviction_policy().score(y_id), None);
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn random_eviction_only_picks_idle_instances() {
            let mut cache: CachedFactory<u8, (), u8, _, _, _> = CachedFactory::with_policies(
                AmountLimitedCreation::try_new(2).unwrap(),
                EvictRandom::with_seed(3),
                NoStatistics,
            );
            for id in 0..3 {
                cache.register(id, move |()| id);
            }
            let keep = cache.create_object(0, ()).unwrap();
            let idle = cache.create_object(1, ()).unwrap();
            let idle_id = idle.id();
            cache.release_object(idle).unwrap();

            let _new = cache.create_object(2, ()).unwrap();
            assert_eq!(cache.get(&keep), Some(&0));
            assert!(!cache.is_checked_out(idle_id));
            assert_eq!(cache.idle_count(), 0);
            assert_eq!(cache.eviction_policy().occurrences(idle_id), 0);
        }
    }

    // ==============================================
    // Admission
    // ==============================================

    mod admission {
        use super::*;
        use test_log::test;

        #[test]
        fn never_create_is_forbidden() {
            let mut cache: CachedFactory<u8, (), u8, NeverCreate, EvictLru, SimpleStatistics> =
                CachedFactory::with_policies(NeverCreate, EvictLru::new(), SimpleStatistics::new());
            cache.register(0, |()| 0);
            assert_eq!(
                cache.create_object(0, ()).unwrap_err(),
                CacheError::CreationForbidden
            );
            assert!(cache.is_empty());
            assert_eq!(cache.statistics().unwrap().fetched, 0);
        }

        #[test]
        fn rate_limit_surfaces_error() {
            let mut cache: CachedFactory<u8, (u8,), u8, _, _, _> = CachedFactory::with_policies(
                RateLimitedCreation::try_new(1, Duration::from_secs(3600)).unwrap(),
                EvictLru::new(),
                NoStatistics,
            );
            cache.register(0, |(n,)| n);

            // the log may hold max_creations entries before refusing
            let _first = cache.create_object(0, (1,)).unwrap();
            let _second = cache.create_object(0, (2,)).unwrap();
            let err = cache.create_object(0, (3,)).unwrap_err();
            assert!(matches!(
                err,
                CacheError::CreationRateExceeded { max_creations: 1, .. }
            ));
            assert_eq!(cache.len(), 2);
        }

        #[test]
        fn pool_hits_bypass_admission() {
            let mut cache: CachedFactory<u8, (), u8, _, _, _> = CachedFactory::with_policies(
                AmountLimitedCreation::try_new(1).unwrap(),
                EvictLru::new(),
                NoStatistics,
            );
            cache.register(0, |()| 0);
            let h = cache.create_object(0, ()).unwrap();
            cache.release_object(h).unwrap();
            // at the cap, but the idle instance needs no admission
            let again = cache.create_object(0, ()).unwrap();
            assert_eq!(cache.get(&again), Some(&0));
            assert_eq!(cache.creation_policy().live(), 1);
        }

        #[test]
        fn raising_the_cap_avoids_eviction() {
            let mut cache = lru_cache(1);
            let a = cache.create_object("a", ()).unwrap();
            assert!(cache.create_object("b", ()).is_err());

            cache.creation_policy_mut().set_max_creation(2).unwrap();
            let b = cache.create_object("b", ()).unwrap();
            assert_eq!(cache.len(), 2);
            cache.release_object(a).unwrap();
            cache.release_object(b).unwrap();
        }

        #[test]
        fn unknown_identifier_fails_before_eviction() {
            let mut cache = lru_cache(1);
            let a = cache.create_object("a", ()).unwrap();
            let a_id = a.id();
            cache.release_object(a).unwrap();

            assert_eq!(
                cache.create_object("zzz", ()).unwrap_err(),
                CacheError::UnknownIdentifier {
                    id: "\"zzz\"".to_string()
                }
            );
            // the idle "a" was not sacrificed
            assert_eq!(cache.eviction_policy().score(a_id), Some(1));
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn unregistered_ids_still_serve_pooled_objects() {
            let mut cache = lru_cache(4);
            let a = cache.create_object("a", ()).unwrap();
            cache.release_object(a).unwrap();
            assert!(cache.unregister(&"a"));
            assert!(!cache.is_registered(&"a"));

            let again = cache.create_object("a", ()).unwrap();
            cache.release_object(again).unwrap();
            cache.create_object("a", ()).unwrap();
            assert!(cache.create_object("a", ()).is_err());
        }
    }

    // ==============================================
    // Statistics and diagnostics
    // ==============================================

    mod diagnostics {
        use super::*;

        #[test]
        fn hit_and_miss_counts() {
            let mut cache = lru_cache(10);
            // 3 misses
            let handles: Vec<RawHandle> = ["a", "b", "c"]
                .into_iter()
                .map(|id| cache.create_object(id, ()).unwrap())
                .collect();
            for handle in handles {
                cache.release_object(handle).unwrap();
            }
            // 2 hits
            for id in ["a", "b"] {
                let handle = cache.create_object(id, ()).unwrap();
                cache.release_object(handle).unwrap();
            }

            let stats = cache.statistics().unwrap();
            assert_eq!(stats.fetched, 5);
            assert_eq!(stats.hits, 2);
            assert_eq!(stats.misses(), 3);
            assert_eq!(stats.created, 3);
            assert_eq!(stats.out, 0);
            assert_eq!(stats.efficiency(), Some(40.0));
        }

        #[test]
        fn configuration_names_policies() {
            let cache = lru_cache(2);
            let text = cache.configuration();
            assert!(text.contains("Encapsulation : raw pointer"));
            assert!(text.contains("Creation      : amount limited"));
            assert!(text.contains("Eviction      : LRU"));
            assert!(text.contains("Statistics    : simple"));
        }

        #[test]
        fn report_includes_statistics_only_when_counted() {
            let counted = lru_cache(2);
            assert!(counted.report().contains("Created objects"));

            let silent: CachedFactory<u8, (), u8> = CachedFactory::new();
            let report = silent.report();
            assert!(report.contains("Statistics    : no"));
            assert!(!report.contains("Created objects"));
            assert_eq!(silent.statistics(), None);
        }

        #[test]
        fn default_policies() {
            let cache: CachedFactory<u8, (), u8> = CachedFactory::default();
            assert_eq!(cache.creation_policy().name(), "always");
            assert_eq!(cache.eviction_policy().name(), "random");
            assert_eq!(cache.statistics_policy().name(), "no");
            assert_eq!(cache.encapsulation_policy().name(), "raw pointer");
        }

        #[test]
        fn debug_summarises_state() {
            let mut cache = lru_cache(2);
            let _a = cache.create_object("a", ()).unwrap();
            let text = format!("{:?}", cache);
            assert!(text.contains("live: 1"));
            assert!(text.contains("out: 1"));
        }
    }

    // ==============================================
    // Teardown
    // ==============================================

    mod teardown {
        use super::*;

        struct Tracked(Arc<AtomicUsize>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        #[test]
        fn drop_destroys_idle_and_checked_out() {
            let dropped = Arc::new(AtomicUsize::new(0));
            let mut cache: CachedFactory<u8, (), Tracked> = CachedFactory::new();
            let counter = Arc::clone(&dropped);
            cache.register(0, move |()| Tracked(Arc::clone(&counter)));

            let idle = cache.create_object(0, ()).unwrap();
            let _out = cache.create_object(0, ()).unwrap();
            cache.release_object(idle).unwrap();
            assert_eq!(dropped.load(Ordering::SeqCst), 0);

            drop(cache);
            assert_eq!(dropped.load(Ordering::SeqCst), 2);
        }

        #[test]
        fn eviction_drops_the_product() {
            let dropped = Arc::new(AtomicUsize::new(0));
            let mut cache: CachedFactory<u8, (), Tracked, _, _, _> = CachedFactory::with_policies(
                AmountLimitedCreation::try_new(1).unwrap(),
                EvictLru::new(),
                NoStatistics,
            );
            for id in 0..2 {
                let counter = Arc::clone(&dropped);
                cache.register(id, move |()| Tracked(Arc::clone(&counter)));
            }
            let first = cache.create_object(0, ()).unwrap();
            cache.release_object(first).unwrap();
            let _second = cache.create_object(1, ()).unwrap();
            assert_eq!(dropped.load(Ordering::SeqCst), 1);
        }
    }

    // ==============================================
    // Property tests
    // ==============================================

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            Create(u8, u8),
            Release(usize),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..3, 0u8..2).prop_map(|(id, param)| Op::Create(id, param)),
                (0usize..8).prop_map(Op::Release),
            ]
        }

        proptest! {
            #[test]
            fn pool_and_registry_stay_disjoint(
                max_live in 1usize..5,
                ops in prop::collection::vec(op_strategy(), 0..64)
            ) {
                let mut cache: CachedFactory<u8, (u8,), u16, _, _, _> = CachedFactory::with_policies(
                    AmountLimitedCreation::try_new(max_live).unwrap(),
                    EvictLru::new(),
                    SimpleStatistics::new(),
                );
                for id in 0..3u8 {
                    cache.register(id, move |(param,)| u16::from(id) * 256 + u16::from(param));
                }

                let mut out: Vec<RawHandle> = Vec::new();
                for op in ops {
                    match op {
                        Op::Create(id, param) => {
                            if let Ok(handle) = cache.create_object(id, (param,)) {
                                prop_assert_eq!(
                                    cache.get(&handle).copied(),
                                    Some(u16::from(id) * 256 + u16::from(param))
                                );
                                out.push(handle);
                            }
                        },
                        Op::Release(index) => {
                            if !out.is_empty() {
                                let handle = out.swap_remove(index % out.len());
                                prop_assert!(cache.release_object(handle).is_ok());
                            }
                        },
                    }
                    prop_assert!(cache.check_invariants().is_ok());
                    prop_assert!(cache.len() <= max_live);
                    prop_assert_eq!(cache.out_count(), out.len());
                    prop_assert_eq!(cache.idle_count() + cache.out_count(), cache.len());
                }
            }
        }
    }
}
