use crate::metrics::snapshot::StatisticsSnapshot;
use crate::traits::StatisticsPolicy;

/// Statistics policy that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStatistics;

impl StatisticsPolicy for NoStatistics {
    #[inline]
    fn on_create(&mut self) {}

    #[inline]
    fn on_fetch(&mut self) {}

    #[inline]
    fn on_release(&mut self) {}

    #[inline]
    fn on_destroy(&mut self) {}

    #[inline]
    fn snapshot(&self) -> Option<StatisticsSnapshot> {
        None
    }

    fn name(&self) -> &'static str {
        "no"
    }
}

/// Counting statistics policy.
///
/// A construction is always followed by the fetch that hands the new object
/// out; that fetch is a miss. Any other fetch came from the idle pool and is
/// a hit.
#[derive(Debug, Default, Clone)]
pub struct SimpleStatistics {
    created: u64,
    fetched: u64,
    hits: u64,
    allocated: u64,
    out: u64,
    /// Constructions whose fetch has not been seen yet.
    pending_misses: u64,
}

impl SimpleStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.fetched - self.hits
    }

    pub fn allocated(&self) -> u64 {
        self.allocated
    }

    pub fn out(&self) -> u64 {
        self.out
    }

    pub fn destroyed(&self) -> u64 {
        self.created - self.allocated
    }
}

impl StatisticsPolicy for SimpleStatistics {
    fn on_create(&mut self) {
        self.created += 1;
        self.allocated += 1;
        self.pending_misses += 1;
    }

    fn on_fetch(&mut self) {
        self.fetched += 1;
        self.out += 1;
        if self.pending_misses > 0 {
            self.pending_misses -= 1;
        } else {
            self.hits += 1;
        }
    }

    fn on_release(&mut self) {
        self.out = self.out.saturating_sub(1);
    }

    fn on_destroy(&mut self) {
        self.allocated = self.allocated.saturating_sub(1);
    }

    fn snapshot(&self) -> Option<StatisticsSnapshot> {
        Some(StatisticsSnapshot {
            created: self.created,
            fetched: self.fetched,
            hits: self.hits,
            allocated: self.allocated,
            out: self.out,
        })
    }

    fn name(&self) -> &'static str {
        "simple"
    }
}
