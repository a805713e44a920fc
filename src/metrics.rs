//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Remote (GitHub API) Metrics
    pub static ref REMOTE_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("emojiapp_remote_requests_total", "Total number of GitHub API requests"),
        &["endpoint", "status"]
    ).expect("metric can be created");
    pub static ref REMOTE_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "emojiapp_remote_request_duration_seconds",
            "GitHub API request duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["endpoint"]
    ).expect("metric can be created");

    // Cache Metrics
    pub static ref CACHE_HITS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("emojiapp_cache_hits_total", "Total number of cache hits"),
        &["cache"]
    ).expect("metric can be created");
    pub static ref CACHE_MISSES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("emojiapp_cache_misses_total", "Total number of cache misses"),
        &["cache"]
    ).expect("metric can be created");

    // Pagination Metrics
    pub static ref MEDIATOR_LOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("emojiapp_mediator_loads_total", "Total number of remote mediator loads"),
        &["load_type", "outcome"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("emojiapp_errors_total", "Total number of errors"),
        &["error_type"]
    ).expect("metric can be created");
}

static INIT: Once = Once::new();

/// Initialize metrics registry.
///
/// Safe to call more than once; only the first call registers.
pub fn init_metrics() {
    INIT.call_once(|| {
        REGISTRY
            .register(Box::new(REMOTE_REQUESTS_TOTAL.clone()))
            .expect("REMOTE_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(REMOTE_REQUEST_DURATION_SECONDS.clone()))
            .expect("REMOTE_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(CACHE_HITS_TOTAL.clone()))
            .expect("CACHE_HITS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(CACHE_MISSES_TOTAL.clone()))
            .expect("CACHE_MISSES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(MEDIATOR_LOADS_TOTAL.clone()))
            .expect("MEDIATOR_LOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::debug!("Metrics registry initialized");
    });
}

/// Record a finished GitHub API request.
pub fn observe_remote_request(endpoint: &str, status: &str, elapsed: Duration) {
    REMOTE_REQUESTS_TOTAL
        .with_label_values(&[endpoint, status])
        .inc();
    REMOTE_REQUEST_DURATION_SECONDS
        .with_label_values(&[endpoint])
        .observe(elapsed.as_secs_f64());
}

/// Record a cache lookup.
pub fn observe_cache_lookup(cache: &str, hit: bool) {
    if hit {
        CACHE_HITS_TOTAL.with_label_values(&[cache]).inc();
    } else {
        CACHE_MISSES_TOTAL.with_label_values(&[cache]).inc();
    }
}

/// Render all registered metrics in Prometheus text format.
pub fn render() -> Result<String, crate::error::AppError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| crate::error::AppError::Internal(e.into()))?;
    String::from_utf8(buffer).map_err(|e| crate::error::AppError::Internal(e.into()))
}
