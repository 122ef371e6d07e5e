use std::io::Write;

use parking_lot::Mutex;

use crate::metrics::snapshot::StatisticsSnapshot;
use crate::metrics::traits::MetricsExporter;

/// Prometheus text exporter for cache statistics snapshots.
///
/// Writes the Prometheus text exposition format so the output can be scraped
/// directly or forwarded to a collector.
#[derive(Debug)]
pub struct PrometheusTextExporter<W: Write + Send> {
    prefix: String,
    writer: Mutex<W>,
}

impl<W: Write + Send> PrometheusTextExporter<W> {
    pub fn new(prefix: impl Into<String>, writer: W) -> Self {
        Self {
            prefix: prefix.into(),
            writer: Mutex::new(writer),
        }
    }

    /// Consumes the exporter and hands back the writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_metric(&self, kind: &str, suffix: &str, value: u64) {
        let name = self.metric_name(suffix);
        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "# TYPE {} {}", name, kind);
        let _ = writeln!(writer, "{} {}", name, value);
    }

    fn metric_name(&self, suffix: &str) -> String {
        if self.prefix.is_empty() {
            suffix.to_string()
        } else {
            format!("{}_{}", self.prefix, suffix)
        }
    }
}

impl<W: Write + Send> MetricsExporter<StatisticsSnapshot> for PrometheusTextExporter<W> {
    fn export(&self, snapshot: &StatisticsSnapshot) {
        self.write_metric("counter", "created_total", snapshot.created);
        self.write_metric("counter", "fetched_total", snapshot.fetched);
        self.write_metric("counter", "hits_total", snapshot.hits);
        self.write_metric("counter", "misses_total", snapshot.misses());
        self.write_metric("counter", "destroyed_total", snapshot.destroyed());
        self.write_metric("gauge", "allocated", snapshot.allocated);
        self.write_metric("gauge", "out", snapshot.out);
    }
}
