//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use std::sync::Once;

use lazy_static::lazy_static;
use prometheus::{Counter, HistogramOpts, IntCounterVec, Opts, Registry};

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("carlot_http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    ).expect("metric can be created");
    pub static ref HTTP_REQUEST_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "carlot_http_request_duration_seconds",
            "HTTP request duration in seconds"
        ).buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["method", "endpoint"]
    ).expect("metric can be created");

    // Storage Metrics
    pub static ref STORAGE_ATTEMPTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("carlot_storage_attempts_total", "Signed object store calls per candidate"),
        &["region", "style", "outcome"]
    ).expect("metric can be created");
    pub static ref STORAGE_UPLOADS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("carlot_storage_uploads_total", "Image uploads by terminal status"),
        &["status"]
    ).expect("metric can be created");
    pub static ref STORAGE_BYTES_UPLOADED: Counter = Counter::new(
        "carlot_storage_bytes_uploaded_total",
        "Total bytes of image data stored"
    ).expect("metric can be created");
    pub static ref STORAGE_DELETES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("carlot_storage_deletes_total", "Object deletions by outcome"),
        &["outcome"]
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("carlot_errors_total", "Total number of errors"),
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
            .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
            .expect("HTTP_REQUESTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()))
            .expect("HTTP_REQUEST_DURATION_SECONDS can be registered");
        REGISTRY
            .register(Box::new(STORAGE_ATTEMPTS_TOTAL.clone()))
            .expect("STORAGE_ATTEMPTS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORAGE_UPLOADS_TOTAL.clone()))
            .expect("STORAGE_UPLOADS_TOTAL can be registered");
        REGISTRY
            .register(Box::new(STORAGE_BYTES_UPLOADED.clone()))
            .expect("STORAGE_BYTES_UPLOADED can be registered");
        REGISTRY
            .register(Box::new(STORAGE_DELETES_TOTAL.clone()))
            .expect("STORAGE_DELETES_TOTAL can be registered");
        REGISTRY
            .register(Box::new(ERRORS_TOTAL.clone()))
            .expect("ERRORS_TOTAL can be registered");

        tracing::info!("Metrics registry initialized");
    });
}
