//! Consumption side of cache statistics.
//!
//! Recording lives in [`StatisticsPolicy`](crate::traits::StatisticsPolicy),
//! which the cache drives on every lifecycle event. This module covers what
//! happens to the numbers afterwards:
//!
//! ```text
//!   StatisticsPolicy ──snapshot()──► StatisticsSnapshot ──export()──► backend
//!   (recording, per event)           (plain copy)          MetricsExporter<S>
//! ```

/// Export/publish a snapshot to a monitoring backend.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
