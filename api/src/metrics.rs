use std::sync::Arc;

use once_cell::sync::Lazy;
use pipeline::{DiagnosticSink, FormState, RequestContext, Validator};
use prometheus::{
    opts, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Registry, TextEncoder,
};
use shared::{ErrorMessageSet, FieldError, MappingConfig};

macro_rules! counter_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| IntCounterVec::new(opts!($name, $help), $labels).unwrap())
    };
}
macro_rules! histogram_vec {
    ($name:expr, $help:expr, $labels:expr) => {
        Lazy::new(|| {
            HistogramVec::new(HistogramOpts::new($name, $help).buckets(LATENCY_BUCKETS.to_vec()), $labels)
                .unwrap()
        })
    };
}
macro_rules! gauge {
    ($name:expr, $help:expr) => {
        Lazy::new(|| IntGauge::new($name, $help).unwrap())
    };
}

const LATENCY_BUCKETS: [f64; 11] = [0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0];

// ── HTTP ────────────────────────────────────────────────────────────────────
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> =
    counter_vec!("http_requests_total", "Total HTTP requests", &["method", "path", "status"]);
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> =
    histogram_vec!("http_request_duration_seconds", "HTTP request latency", &["method", "path"]);
pub static HTTP_IN_FLIGHT: Lazy<IntGauge> = gauge!("http_requests_in_flight", "In-flight HTTP requests");

// ── Dispatch ────────────────────────────────────────────────────────────────
pub static VALIDATION_FAILURES: Lazy<IntCounterVec> = counter_vec!(
    "validation_failures_total",
    "Requests returned to their input because validation failed",
    &["mapping"]
);
pub static VALIDATION_ERRORS: Lazy<IntCounterVec> =
    counter_vec!("validation_errors_total", "Validation messages reported", &["field"]);
pub static DISPATCH_ERRORS: Lazy<IntCounterVec> =
    counter_vec!("dispatch_errors_total", "Errors no exception handler claimed", &["kind"]);

pub fn register_all(r: &Registry) -> prometheus::Result<()> {
    r.register(Box::new(HTTP_REQUESTS_TOTAL.clone()))?;
    r.register(Box::new(HTTP_REQUEST_DURATION.clone()))?;
    r.register(Box::new(HTTP_IN_FLIGHT.clone()))?;
    r.register(Box::new(VALIDATION_FAILURES.clone()))?;
    r.register(Box::new(VALIDATION_ERRORS.clone()))?;
    r.register(Box::new(DISPATCH_ERRORS.clone()))?;
    Ok(())
}

pub fn gather_metrics(r: &Registry) -> String {
    let encoder = TextEncoder::new();
    let families = r.gather();
    let mut buf = Vec::new();
    encoder.encode(&families, &mut buf).unwrap_or_default();
    String::from_utf8(buf).unwrap_or_default()
}

pub fn observe_http(method: &str, path: &str, status: u16, duration_secs: f64) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION
        .with_label_values(&[method, path])
        .observe(duration_secs);
}

/// Counts every reported message per field, then hands it to the inner sink
pub struct MetricsSink {
    inner: Arc<dyn DiagnosticSink>,
}

impl MetricsSink {
    pub fn new(inner: Arc<dyn DiagnosticSink>) -> Self {
        Self { inner }
    }
}

impl DiagnosticSink for MetricsSink {
    fn record(&self, error: &FieldError) {
        VALIDATION_ERRORS.with_label_values(&[&error.field]).inc();
        self.inner.record(error);
    }
}

/// Counts failed validations per mapping
pub struct MeteredValidator<V> {
    inner: V,
}

impl<V: Validator> MeteredValidator<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }
}

impl<V: Validator> Validator for MeteredValidator<V> {
    fn validate(
        &self,
        mapping: &MappingConfig,
        form: &FormState,
        ctx: &RequestContext,
    ) -> Option<ErrorMessageSet> {
        let errors = self.inner.validate(mapping, form, ctx);
        if errors.as_ref().is_some_and(|e| !e.is_empty()) {
            VALIDATION_FAILURES.with_label_values(&[&mapping.path]).inc();
        }
        errors
    }
}
