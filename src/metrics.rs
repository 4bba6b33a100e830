use std::time::Duration;

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};

use crate::error::Result;

/// Prometheus instrumentation for the scan loop, backed by an owned registry.
#[derive(Debug)]
pub struct Metrics {
    registry: Registry,
    namespace_count: IntGauge,
    scan_duration: Histogram,
    objects_scanned: IntCounter,
    stuck_objects: IntGauge,
}

impl Metrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let namespace_count = IntGauge::new(
            "k8s_deletion_inspector_namespace_count",
            "Number of namespaces",
        )?;
        registry.register(Box::new(namespace_count.clone()))?;

        let scan_duration = Histogram::with_opts(HistogramOpts::new(
            "k8s_deletion_inspector_scan_duration_seconds",
            "Duration of the scan in seconds",
        ))?;
        registry.register(Box::new(scan_duration.clone()))?;

        let objects_scanned = IntCounter::new(
            "k8s_deletion_inspector_total_objects_scanned",
            "Total number of objects scanned",
        )?;
        registry.register(Box::new(objects_scanned.clone()))?;

        let stuck_objects = IntGauge::new(
            "k8s_deletion_inspector_stuck_resources_total",
            "Number of stuck objects",
        )?;
        registry.register(Box::new(stuck_objects.clone()))?;

        Ok(Self {
            registry,
            namespace_count,
            scan_duration,
            objects_scanned,
            stuck_objects,
        })
    }

    pub fn set_namespace_count(&self, count: usize) {
        self.namespace_count.set(count as i64);
    }

    pub fn set_stuck_count(&self, count: usize) {
        self.stuck_objects.set(count as i64);
    }

    pub fn record_scan(&self, duration: Duration, objects_scanned: usize) {
        self.scan_duration.observe(duration.as_secs_f64());
        self.objects_scanned.inc_by(objects_scanned as u64);
    }

    /// Renders the registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buf = String::new();
        TextEncoder::new().encode_utf8(&self.registry.gather(), &mut buf)?;
        Ok(buf)
    }
}
