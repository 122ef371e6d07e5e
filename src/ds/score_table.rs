//! Per-instance score table shared by the scoring eviction policies.
//!
//! Maps each live product identity to a score. LRU and Aging differ only in
//! how scores move on release; both pick their victim here.
//!
//! ```text
//!   ObjectId ──► score
//!   ─────────────────────
//!     #1     ──►   3        select_min(is_idle):
//!     #2     ──►   1  ◄──     min (score, id) over idle entries
//!     #3     ──►   0          all idle scores 0 ⇒ EvictionImpossible
//! ```
//!
//! Eviction is refused only when every evictable instance scores zero. A
//! single nonzero score means some idle instance has come back through the
//! pool, and the lowest one is then fair game even if it has decayed to zero.

use rustc_hash::FxHashMap;

use crate::error::{CacheError, Result};
use crate::handle::ObjectId;

#[derive(Debug, Clone)]
pub struct ScoreTable<S> {
    scores: FxHashMap<ObjectId, S>,
}

impl<S> Default for ScoreTable<S> {
    fn default() -> Self {
        Self {
            scores: FxHashMap::default(),
        }
    }
}

impl<S> ScoreTable<S>
where
    S: Copy + Ord + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id` at the zero score; resets it if already tracked.
    pub fn track(&mut self, id: ObjectId) {
        self.scores.insert(id, S::default());
    }

    /// Stops tracking `id`. Returns its last score.
    pub fn untrack(&mut self, id: ObjectId) -> Option<S> {
        self.scores.remove(&id)
    }

    pub fn score(&self, id: ObjectId) -> Option<S> {
        self.scores.get(&id).copied()
    }

    pub fn score_mut(&mut self, id: ObjectId) -> Option<&mut S> {
        self.scores.get_mut(&id)
    }

    /// Applies `update` to every tracked score.
    pub fn update_all(&mut self, mut update: impl FnMut(ObjectId, &mut S)) {
        for (id, score) in self.scores.iter_mut() {
            update(*id, score);
        }
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.scores.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Lowest-scoring evictable instance, ties going to the older identity.
    ///
    /// Fails when no instance is evictable or all of them score zero.
    pub fn select_min(&self, is_evictable: &dyn Fn(ObjectId) -> bool) -> Result<ObjectId> {
        let mut best: Option<(S, ObjectId)> = None;
        let mut any_scored = false;
        for (&id, &score) in self.scores.iter().filter(|(id, _)| is_evictable(**id)) {
            any_scored |= score != S::default();
            match best {
                Some(current) if current <= (score, id) => {},
                _ => best = Some((score, id)),
            }
        }

        match best {
            Some((_, id)) if any_scored => Ok(id),
            _ => Err(CacheError::EvictionImpossible),
        }
    }
}
