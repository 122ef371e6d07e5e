use std::fmt;

/// Point-in-time copy of the lifecycle counters.
///
/// Derived values (`misses`, `destroyed`, `efficiency`) are computed from the
/// stored counters and never drift from them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatisticsSnapshot {
    /// Products constructed.
    pub created: u64,
    /// Products handed out, hit or miss.
    pub fetched: u64,
    /// Fetches served from the idle pool.
    pub hits: u64,
    /// Live products (idle + checked out).
    pub allocated: u64,
    /// Products currently checked out.
    pub out: u64,
}

impl StatisticsSnapshot {
    /// Fetches that required a construction.
    #[inline]
    pub fn misses(&self) -> u64 {
        self.fetched - self.hits
    }

    /// Products destroyed by eviction.
    #[inline]
    pub fn destroyed(&self) -> u64 {
        self.created - self.allocated
    }

    /// Hit percentage; `None` until something was fetched.
    pub fn efficiency(&self) -> Option<f64> {
        if self.fetched == 0 {
            None
        } else {
            Some(100.0 * self.hits as f64 / self.fetched as f64)
        }
    }
}

impl fmt::Display for StatisticsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "############################")?;
        writeln!(f, "## Cache statistics")?;
        writeln!(f, "## + Created objects     : {}", self.created)?;
        writeln!(f, "## + Fetched objects     : {}", self.fetched)?;
        writeln!(f, "## + Destroyed objects   : {}", self.destroyed())?;
        writeln!(f, "## + Cache hit           : {}", self.hits)?;
        writeln!(f, "## + Cache miss          : {}", self.misses())?;
        writeln!(f, "## + Currently allocated : {}", self.allocated)?;
        writeln!(f, "## + Currently out       : {}", self.out)?;
        writeln!(f, "############################")?;
        if let Some(efficiency) = self.efficiency() {
            writeln!(f, "## Overall efficiency {:.2}%", efficiency)?;
            writeln!(f, "############################")?;
        }
        Ok(())
    }
}
