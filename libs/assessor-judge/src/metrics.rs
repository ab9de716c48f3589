// Prometheus metrics for the judging pipeline

use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

lazy_static! {
    pub static ref CACHE_HITS: IntCounter = register_int_counter!(
        "assessor_cache_hits_total",
        "Result cache lookups that returned a live entry"
    )
    .expect("metric can be registered");
    pub static ref CACHE_MISSES: IntCounter = register_int_counter!(
        "assessor_cache_misses_total",
        "Result cache lookups that required execution"
    )
    .expect("metric can be registered");
    pub static ref FALLBACKS: IntCounterVec = register_int_counter_vec!(
        "assessor_fallback_total",
        "Executions routed to the local simulator, by reason",
        &["reason"]
    )
    .expect("metric can be registered");
    pub static ref REMOTE_POLLS: IntCounter = register_int_counter!(
        "assessor_remote_polls_total",
        "Status polls sent to the judge backend"
    )
    .expect("metric can be registered");
    pub static ref CASE_EXECUTION_MS: Histogram = register_histogram!(
        "assessor_case_execution_ms",
        "Reported execution time per judged case in milliseconds",
        vec![5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]
    )
    .expect("metric can be registered");
}

/// Render the default registry in the Prometheus text format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
