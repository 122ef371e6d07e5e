//! # Policy Trait Hierarchy
//!
//! [`CachedFactory`](crate::cache::CachedFactory) is composed from four
//! independent policies. Each one is a small trait; the cache owns one value
//! of each and calls its hooks at fixed lifecycle points.
//!
//! ## Architecture
//!
//! ```text
//!                         ┌────────────────────────────────────┐
//!                         │      CachedFactory<Id, P, T, ..>   │
//!                         │  idle pool · checked-out registry  │
//!                         └──┬──────────┬──────────┬────────┬──┘
//!                            │          │          │        │
//!            ┌───────────────┘          │          │        └───────────────┐
//!            ▼                          ▼          ▼                        ▼
//!  ┌───────────────────┐  ┌───────────────────┐  ┌───────────────────┐  ┌──────────────────┐
//!  │  CreationPolicy   │  │  EvictionPolicy   │  │ StatisticsPolicy  │  │  Encapsulation   │
//!  │                   │  │                   │  │                   │  │                  │
//!  │ can_create()      │  │ on_create(id)     │  │ on_create()       │  │ encapsulate(id)  │
//!  │ on_create()       │  │ on_fetch(id)      │  │ on_fetch()        │  │ object_id(&h)    │
//!  │ on_destroy()      │  │ on_release(id)    │  │ on_release()      │  │ release(h)       │
//!  │                   │  │ on_destroy(id)    │  │ on_destroy()      │  │                  │
//!  │                   │  │ select_victim(..) │  │ snapshot()        │  │                  │
//!  └───────────────────┘  └───────────────────┘  └───────────────────┘  └──────────────────┘
//!   Always / Never /       Lru / Aging /          No / Simple            RawPointer
//!   RateLimited /          Random
//!   AmountLimited
//! ```
//!
//! ## Hook Order
//!
//! | Event    | Hooks fired (in order)                           |
//! |----------|--------------------------------------------------|
//! | create   | creation, statistics, eviction                   |
//! | fetch    | statistics, eviction                             |
//! | release  | statistics, eviction                             |
//! | destroy  | creation, statistics, eviction                   |
//!
//! A fetch follows every create (a constructed object is always handed out),
//! and fetches served from the idle pool fire no create hook.
//!
//! ## Eviction Without Back-References
//!
//! Eviction policies never call into the cache. [`EvictionPolicy::select_victim`]
//! receives a predicate telling which instances are idle, nominates one, and
//! the cache removes it:
//!
//! ```text
//!   cache ── select_victim(&is_idle) ──► policy
//!   cache ◄──────── Ok(victim) ───────── policy
//!   cache: remove(victim) ── on_destroy hooks ── drop(product)
//! ```

use crate::error::Result;
use crate::handle::ObjectId;
use crate::metrics::snapshot::StatisticsSnapshot;

/// Admission control: may a new product be constructed right now?
pub trait CreationPolicy {
    /// Asked before every construction.
    ///
    /// - `Ok(true)`: construct.
    /// - `Ok(false)`: the cache evicts one idle instance first, then constructs.
    /// - `Err(_)`: the request fails and nothing changes.
    fn can_create(&mut self) -> Result<bool>;

    /// A product was constructed.
    fn on_create(&mut self);

    /// A product was destroyed by eviction.
    fn on_destroy(&mut self);

    /// Short human-readable policy name.
    fn name(&self) -> &'static str;
}

/// Victim selection and the per-instance bookkeeping it needs.
///
/// Implementations must drop every trace of an instance in
/// [`on_destroy`](EvictionPolicy::on_destroy).
pub trait EvictionPolicy {
    /// A product was constructed.
    fn on_create(&mut self, id: ObjectId);

    /// A product was handed out (hit or miss).
    fn on_fetch(&mut self, id: ObjectId);

    /// A product came back to the idle pool.
    fn on_release(&mut self, id: ObjectId);

    /// A product was destroyed.
    fn on_destroy(&mut self, id: ObjectId);

    /// Nominates exactly one instance for which `is_evictable` returns `true`.
    ///
    /// Returns [`CacheError::EvictionImpossible`](crate::error::CacheError::EvictionImpossible)
    /// when no instance qualifies. Must not change bookkeeping: the cache
    /// reports the actual removal through `on_destroy`.
    fn select_victim(&mut self, is_evictable: &dyn Fn(ObjectId) -> bool) -> Result<ObjectId>;

    /// Short human-readable policy name.
    fn name(&self) -> &'static str;
}

/// Observer of the product lifecycle.
pub trait StatisticsPolicy {
    fn on_create(&mut self);
    fn on_fetch(&mut self);
    fn on_release(&mut self);
    fn on_destroy(&mut self);

    /// Current counters, or `None` for policies that do not count.
    fn snapshot(&self) -> Option<StatisticsSnapshot>;

    /// Short human-readable policy name.
    fn name(&self) -> &'static str;
}

/// Shape of the handle returned to clients.
pub trait Encapsulation {
    /// Client-facing handle type.
    type Handle;

    /// Wraps a freshly checked-out instance.
    fn encapsulate(&self, id: ObjectId) -> Self::Handle;

    /// Identity behind a handle, without consuming it.
    fn object_id(&self, handle: &Self::Handle) -> ObjectId;

    /// Consumes a handle on release.
    fn release(&self, handle: Self::Handle) -> ObjectId;

    /// Short human-readable policy name.
    fn name(&self) -> &'static str;
}
