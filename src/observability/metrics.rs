use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const OUTCOME_CACHE_HIT: &str = "cache_hit";
pub const OUTCOME_ISSUED: &str = "issued";

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process wide `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Issuer metrics
    pub token_requests: IntCounterVec,
    pub token_exchange_failures: IntCounterVec,
    pub token_exchange_duration: HistogramVec,

    // Cache metrics
    pub cache_store_failures: IntCounterVec,
    pub token_expiry_unix: IntGaugeVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("boxtoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Issuer
            token_requests: IntCounterVec::new(Opts::new("token_requests_total", "Token requests by subject and outcome"), &["subject", "outcome"]).unwrap(),
            token_exchange_failures: IntCounterVec::new(Opts::new("token_exchange_failures_total", "Failed assertion exchanges by reason"), &["subject", "reason"]).unwrap(),
            token_exchange_duration: HistogramVec::new(HistogramOpts::new("token_exchange_duration_seconds", "Assertion exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["subject"]).unwrap(),

            // Cache
            cache_store_failures: IntCounterVec::new(Opts::new("cache_store_failures_total", "Failed token cache writes"), &["subject"]).unwrap(),
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Expiry of the last issued token"), &["subject"]).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_exchange_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.cache_store_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();

        metrics
    }

    /// Registry content in the Prometheus text exposition format.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if encoder.encode(&self.registry.gather(), &mut buffer).is_err() {
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}
