//! # Metrics
//!
//! Prometheus metrics for cache effectiveness and backend calls.
//!
//! ## Metrics Exposed
//!
//! - `gcp_secrets_cache_hits_total{cache}` - Fresh cache entries served (`address` or `value`)
//! - `gcp_secrets_cache_misses_total{cache}` - Lookups that fell through to the backend
//! - `gcp_secrets_backend_operations_total{operation}` - Completed backend calls
//! - `gcp_secrets_backend_operation_errors_total{operation}` - Failed backend calls
//! - `gcp_secrets_backend_operation_duration_seconds{operation}` - Backend call latency

use prometheus::{HistogramVec, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

/// Cache label for resolved addresses
pub const ADDRESS_CACHE: &str = "address";
/// Cache label for decoded values
pub const VALUE_CACHE: &str = "value";

static CACHE_HITS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_secrets_cache_hits_total",
            "Total number of lookups served from a fresh cache entry",
        ),
        &["cache"],
    )
    .expect("Failed to create CACHE_HITS_TOTAL metric - this should never happen")
});

static CACHE_MISSES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_secrets_cache_misses_total",
            "Total number of lookups with no fresh cache entry",
        ),
        &["cache"],
    )
    .expect("Failed to create CACHE_MISSES_TOTAL metric - this should never happen")
});

static BACKEND_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_secrets_backend_operations_total",
            "Total number of Secret Manager calls by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create BACKEND_OPERATIONS_TOTAL metric - this should never happen")
});

pub(crate) static BACKEND_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "gcp_secrets_backend_operation_errors_total",
            "Total number of failed Secret Manager calls by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create BACKEND_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static BACKEND_OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "gcp_secrets_backend_operation_duration_seconds",
            "Duration of Secret Manager calls in seconds by operation",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create BACKEND_OPERATION_DURATION metric - this should never happen")
});

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(|| {
    let registry = Registry::new();
    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(CACHE_HITS_TOTAL.clone()),
        Box::new(CACHE_MISSES_TOTAL.clone()),
        Box::new(BACKEND_OPERATIONS_TOTAL.clone()),
        Box::new(BACKEND_OPERATION_ERRORS_TOTAL.clone()),
        Box::new(BACKEND_OPERATION_DURATION.clone()),
    ];
    for collector in collectors {
        registry
            .register(collector)
            .expect("Failed to register metric - names are unique");
    }
    registry
});

pub fn increment_cache_hit(cache: &str) {
    CACHE_HITS_TOTAL.with_label_values(&[cache]).inc();
}

pub fn increment_cache_miss(cache: &str) {
    CACHE_MISSES_TOTAL.with_label_values(&[cache]).inc();
}

pub fn record_backend_operation(operation: &str, duration: f64) {
    BACKEND_OPERATIONS_TOTAL
        .with_label_values(&[operation])
        .inc();
    BACKEND_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_backend_operation_errors(operation: &str) {
    BACKEND_OPERATION_ERRORS_TOTAL
        .with_label_values(&[operation])
        .inc();
}

/// Render every metric in the Prometheus text exposition format
///
/// # Errors
/// Returns an error if encoding fails
pub fn gather() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&REGISTRY.gather())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_cache_hit() {
        let before = CACHE_HITS_TOTAL.with_label_values(&[VALUE_CACHE]).get();
        increment_cache_hit(VALUE_CACHE);
        let after = CACHE_HITS_TOTAL.with_label_values(&[VALUE_CACHE]).get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_record_backend_operation() {
        let before = BACKEND_OPERATIONS_TOTAL
            .with_label_values(&["list_versions"])
            .get();
        record_backend_operation("list_versions", 0.02);
        let after = BACKEND_OPERATIONS_TOTAL
            .with_label_values(&["list_versions"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_increment_backend_operation_errors() {
        let before = BACKEND_OPERATION_ERRORS_TOTAL
            .with_label_values(&["access_version"])
            .get();
        increment_backend_operation_errors("access_version");
        let after = BACKEND_OPERATION_ERRORS_TOTAL
            .with_label_values(&["access_version"])
            .get();
        assert_eq!(after, before + 1);
    }

    #[test]
    fn test_gather_includes_registered_metrics() {
        increment_cache_miss(ADDRESS_CACHE);
        let text = gather().unwrap();
        assert!(text.contains("gcp_secrets_cache_misses_total"));
    }
}
