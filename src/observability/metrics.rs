use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Provider metrics
    pub provider_requests: IntCounterVec,
    pub provider_failures: IntCounterVec,
    pub provider_duration: HistogramVec,

    // Cache metrics
    pub cache_lookups: IntCounterVec,
    pub token_replacements: IntCounterVec,

    // Gate metrics
    pub gate_rejections: IntCounterVec,

    // Runtime
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("igbroker".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Provider
            provider_requests: IntCounterVec::new(Opts::new("provider_requests_total", "Total provider calls by operation"),&["call"],).unwrap(),
            provider_failures: IntCounterVec::new(Opts::new("provider_failures_total", "Provider call failures by reason"),&["call", "reason"],).unwrap(),
            provider_duration: HistogramVec::new(HistogramOpts::new("provider_duration_seconds", "Provider call duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),&["call"],).unwrap(),

            // Cache
            cache_lookups: IntCounterVec::new(Opts::new("cache_lookups_total", "Cache reads by entry and result"),&["entry", "result"],).unwrap(),
            token_replacements: IntCounterVec::new(Opts::new("token_replacements_total", "Access token writes by origin"),&["origin"],).unwrap(),

            // Gate
            gate_rejections: IntCounterVec::new(Opts::new("gate_rejections_total", "Requests rejected by a request gate"),&["gate"],).unwrap(),

            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.provider_requests.clone())).unwrap();
        reg.register(Box::new(metrics.provider_failures.clone())).unwrap();
        reg.register(Box::new(metrics.provider_duration.clone())).unwrap();
        reg.register(Box::new(metrics.cache_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.token_replacements.clone())).unwrap();
        reg.register(Box::new(metrics.gate_rejections.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
