use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::engine::cache::CacheOutcome;

pub struct MetricsCollector {
    registry: Registry,

    // Mock request metrics
    pub requests_total: CounterVec,
    pub request_duration: HistogramVec,
    pub requests_in_flight: Gauge,

    // Resolution cache
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub cache_bypasses: Counter,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("mockshape_requests_total", "Total number of mock requests"),
            &["method", "outcome"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "mockshape_request_duration_seconds",
                "Mock request duration in seconds",
            ),
            &["method"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let requests_in_flight = Gauge::new(
            "mockshape_requests_in_flight",
            "Number of mock requests currently being processed",
        )?;
        registry.register(Box::new(requests_in_flight.clone()))?;

        let cache_hits = Counter::new("mockshape_cache_hits_total", "Resolved-schema cache hits")?;
        registry.register(Box::new(cache_hits.clone()))?;

        let cache_misses =
            Counter::new("mockshape_cache_misses_total", "Resolved-schema cache misses")?;
        registry.register(Box::new(cache_misses.clone()))?;

        let cache_bypasses = Counter::new(
            "mockshape_cache_bypasses_total",
            "Resolutions performed outside the cache",
        )?;
        registry.register(Box::new(cache_bypasses.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            requests_in_flight,
            cache_hits,
            cache_misses,
            cache_bypasses,
        })
    }

    pub fn record_cache(&self, outcome: CacheOutcome) {
        match outcome {
            CacheOutcome::Hit => self.cache_hits.inc(),
            CacheOutcome::Miss => self.cache_misses.inc(),
            CacheOutcome::Bypass => self.cache_bypasses.inc(),
        }
    }

    /// `outcome` is "ok" or an error kind.
    pub fn record_request(&self, method: &str, outcome: &str, seconds: f64) {
        self.requests_total
            .with_label_values(&[method, outcome])
            .inc();
        self.request_duration
            .with_label_values(&[method])
            .observe(seconds);
    }

    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

pub struct MetricsHandler {
    collector: Arc<MetricsCollector>,
}

impl MetricsHandler {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }

    pub async fn metrics(&self) -> String {
        self.collector.encode().unwrap_or_else(|e| {
            tracing::error!("Failed to encode metrics: {}", e);
            String::from("# Error encoding metrics\n")
        })
    }
}
