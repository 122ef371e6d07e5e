//! Lifecycle statistics: recording policies, snapshots and export.

pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;

pub use exporter::PrometheusTextExporter;
pub use metrics_impl::{NoStatistics, SimpleStatistics};
pub use snapshot::StatisticsSnapshot;
pub use traits::MetricsExporter;
