//! Least-recently-used eviction, scored by release count.
//!
//! ```text
//!   on_create(x)   score[x] = 0
//!   on_release(x)  score[x] += 1
//!   on_destroy(x)  forget x
//!   select_victim  min score over idle instances (0 ⇒ EvictionImpossible)
//! ```
//!
//! Every idle instance has been released at least once, so its score is at
//! least 1; ties go to the older instance.
//!
//! ## Example Usage
//!
//! ```
//! use cachedfactory::policy::lru::EvictLru;
//! use cachedfactory::CachedFactory;
//! use cachedfactory::policy::creation::AmountLimitedCreation;
//! use cachedfactory::metrics::NoStatistics;
//!
//! let mut cache: CachedFactory<&str, (), String, _, _, _> = CachedFactory::with_policies(
//!     AmountLimitedCreation::try_new(1).unwrap(),
//!     EvictLru::new(),
//!     NoStatistics,
//! );
//! cache.register("a", |()| "A".to_string());
//! cache.register("b", |()| "B".to_string());
//!
//! let a = cache.create_object("a", ()).unwrap();
//! cache.release_object(a).unwrap();
//!
//! // cap of one: "a" is evicted to make room for "b"
//! let b = cache.create_object("b", ()).unwrap();
//! assert_eq!(cache.get(&b).map(String::as_str), Some("B"));
//! assert_eq!(cache.len(), 1);
//! ```

use log::trace;

use crate::ds::ScoreTable;
use crate::error::Result;
use crate::handle::ObjectId;
use crate::traits::EvictionPolicy;

/// LRU eviction policy. See the [module docs](self).
#[derive(Debug, Default, Clone)]
pub struct EvictLru {
    scores: ScoreTable<u64>,
}

impl EvictLru {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release count of `id`, if tracked.
    pub fn score(&self, id: ObjectId) -> Option<u64> {
        self.scores.score(id)
    }

    /// Number of tracked instances.
    pub fn tracked(&self) -> usize {
        self.scores.len()
    }
}

impl EvictionPolicy for EvictLru {
    fn on_create(&mut self, id: ObjectId) {
        self.scores.track(id);
    }

    #[inline]
    fn on_fetch(&mut self, _id: ObjectId) {}

    fn on_release(&mut self, id: ObjectId) {
        if let Some(score) = self.scores.score_mut(id) {
            *score = score.saturating_add(1);
        }
    }

    fn on_destroy(&mut self, id: ObjectId) {
        self.scores.untrack(id);
    }

    fn select_victim(&mut self, is_evictable: &dyn Fn(ObjectId) -> bool) -> Result<ObjectId> {
        let victim = self.scores.select_min(is_evictable)?;
        trace!("lru victim {} (score {:?})", victim, self.scores.score(victim));
        Ok(victim)
    }

    fn name(&self) -> &'static str {
        "LRU"
    }
}
