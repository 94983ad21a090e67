//! Prometheus metrics for a cache instance.
//!
//! Each cache owns its own registry; the metrics task copies the latest
//! [`CacheStats`] snapshot into it.

use prometheus::{Encoder, Gauge, IntGauge, Opts, Registry, TextEncoder};

use crate::cache::stats::CacheStats;

pub struct CacheMetrics {
    registry: Registry,
    entries: IntGauge,
    size_bytes: IntGauge,
    hits: IntGauge,
    stale_hits: IntGauge,
    misses: IntGauge,
    evictions: IntGauge,
    expirations: IntGauge,
    errors: IntGauge,
    predicted_absent: IntGauge,
    hit_rate: Gauge,
    compression_ratio: Gauge,
    performance_score: Gauge,
}

fn int_gauge(registry: &Registry, namespace: &str, name: &str, help: &str) -> prometheus::Result<IntGauge> {
    let gauge = IntGauge::with_opts(Opts::new(name, help).namespace(namespace))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

fn gauge(registry: &Registry, namespace: &str, name: &str, help: &str) -> prometheus::Result<Gauge> {
    let gauge = Gauge::with_opts(Opts::new(name, help).namespace(namespace))?;
    registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

impl CacheMetrics {
    /// Register all cache gauges under `namespace` in a fresh registry.
    pub fn new(namespace: &str) -> prometheus::Result<Self> {
        let registry = Registry::new();
        Ok(Self {
            entries: int_gauge(&registry, namespace, "entries", "Entries currently cached")?,
            size_bytes: int_gauge(&registry, namespace, "size_bytes", "Accounted bytes currently cached")?,
            hits: int_gauge(&registry, namespace, "hits", "Fresh reads served")?,
            stale_hits: int_gauge(&registry, namespace, "stale_hits", "Reads served from the stale window")?,
            misses: int_gauge(&registry, namespace, "misses", "Reads that found nothing usable")?,
            evictions: int_gauge(&registry, namespace, "evictions", "Entries evicted to make room")?,
            expirations: int_gauge(&registry, namespace, "expirations", "Entries removed past hard expiry")?,
            errors: int_gauge(&registry, namespace, "errors", "Hook, adapter and warming errors reported")?,
            predicted_absent: int_gauge(
                &registry,
                namespace,
                "predicted_absent_keys",
                "Keys the predictor expects but the cache lacks",
            )?,
            hit_rate: gauge(&registry, namespace, "hit_rate", "Served reads over all reads")?,
            compression_ratio: gauge(&registry, namespace, "compression_ratio", "Original over stored bytes")?,
            performance_score: gauge(&registry, namespace, "performance_score", "Successful operations, 0-100")?,
            registry,
        })
    }

    pub fn observe(&self, stats: &CacheStats) {
        self.entries.set(stats.entry_count as i64);
        self.size_bytes.set(stats.total_size_bytes as i64);
        self.hits.set(stats.hits as i64);
        self.stale_hits.set(stats.stale_hits as i64);
        self.misses.set(stats.misses as i64);
        self.evictions.set(stats.evictions as i64);
        self.expirations.set(stats.expirations as i64);
        self.errors.set(stats.errors as i64);
        self.predicted_absent.set(stats.predicted_absent_keys as i64);
        self.hit_rate.set(stats.hit_rate);
        self.compression_ratio.set(stats.compression_ratio);
        self.performance_score.set(stats.performance_score);
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render the registry in the Prometheus text exposition format.
    pub fn encode(&self) -> anyhow::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
