//! Random eviction over the release log.
//!
//! Every release appends the instance identity to a log, duplicates included.
//! Eviction draws one log entry uniformly among the entries whose instance is
//! currently idle, so an instance released three times is three times as
//! likely to go as one released once.
//!
//! ## Architecture
//!
//! ```text
//!   releases: A, B, B, C, B
//!
//!   log:   ┌───┬───┬───┬───┬───┐
//!          │ A │ B │ B │ C │ B │      C checked out again
//!          └───┴───┴───┴───┴───┘
//!   draw over idle entries:  A ×1, B ×3   ⇒  P(A)=1/4, P(B)=3/4
//!
//!   on_destroy(B):  log = [A, C]   (every occurrence purged)
//! ```
//!
//! ## Implementation Notes
//!
//! - PRNG is XorShift64: no global state, deterministic per seed
//!   ([`EvictRandom::with_seed`]) and Miri-compatible.
//! - [`EvictRandom::new`] uses a fixed default seed;
//!   [`EvictRandom::from_entropy`] seeds from std's per-process hasher keys.
//! - Selection and destroy are both linear in the log length. Selection
//!   counts the idle entries, then walks to the drawn one without allocating.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use log::trace;

use crate::error::{CacheError, Result};
use crate::handle::ObjectId;
use crate::traits::EvictionPolicy;

const DEFAULT_SEED: u64 = 0x9e37_79b9_7f4a_7c15;

/// Random eviction policy. See the [module docs](self).
#[derive(Debug, Clone)]
pub struct EvictRandom {
    /// Identities in release order, with repeats.
    log: Vec<ObjectId>,
    /// XorShift64 state; never zero.
    rng_state: u64,
}

impl Default for EvictRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl EvictRandom {
    /// Default-seeded policy: every instance draws the same sequence.
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Policy seeded from a fresh [`RandomState`], so draws differ between
    /// caches and between runs.
    pub fn from_entropy() -> Self {
        Self::with_seed(RandomState::new().hash_one(DEFAULT_SEED))
    }

    /// Policy whose draws are reproducible for a given `seed`.
    ///
    /// The seed goes through a SplitMix64 finaliser first, so neighbouring
    /// seeds (0, 1, 2, ...) give unrelated streams.
    pub fn with_seed(seed: u64) -> Self {
        let mut z = seed.wrapping_add(DEFAULT_SEED);
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^= z >> 31;
        Self {
            log: Vec::new(),
            // XorShift is stuck at zero
            rng_state: if z == 0 { DEFAULT_SEED } else { z },
        }
    }

    /// Number of logged releases still referring to live instances.
    pub fn log_len(&self) -> usize {
        self.log.len()
    }

    /// How many times `id` appears in the log.
    pub fn occurrences(&self, id: ObjectId) -> usize {
        self.log.iter().filter(|logged| **logged == id).count()
    }

    fn next_index(&mut self, len: usize) -> usize {
        let mut x = self.rng_state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng_state = x;
        // multiply-high keeps the better-mixed upper bits
        ((u128::from(x) * len as u128) >> 64) as usize
    }
}

impl EvictionPolicy for EvictRandom {
    #[inline]
    fn on_create(&mut self, _id: ObjectId) {}

    #[inline]
    fn on_fetch(&mut self, _id: ObjectId) {}

    fn on_release(&mut self, id: ObjectId) {
        self.log.push(id);
    }

    fn on_destroy(&mut self, id: ObjectId) {
        self.log.retain(|logged| *logged != id);
    }

    fn select_victim(&mut self, is_evictable: &dyn Fn(ObjectId) -> bool) -> Result<ObjectId> {
        let candidates = self.log.iter().filter(|id| is_evictable(**id)).count();
        if candidates == 0 {
            return Err(CacheError::EvictionImpossible);
        }
        let index = self.next_index(candidates);
        let victim = self
            .log
            .iter()
            .copied()
            .filter(|id| is_evictable(*id))
            .nth(index)
            .ok_or(CacheError::EvictionImpossible)?;
        trace!("random victim {} out of {} logged", victim, candidates);
        Ok(victim)
    }

    fn name(&self) -> &'static str {
        "random"
    }
}
