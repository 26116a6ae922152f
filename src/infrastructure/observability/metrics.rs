//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;

use super::config::{CacheMetricNames, MetricsConfig};

static CACHE_METRICS: OnceCell<CacheMetricNames> = OnceCell::new();

static CUSTOMER_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(/api/customers/)[^/]+").expect("customer segment pattern is valid")
});

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
    path: String,
}

impl PrometheusMetrics {
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if CACHE_METRICS.set(config.cache_metric_names()).is_err() {
        tracing::warn!("Cache metric names already set, keeping the first configuration");
    }

    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("northwind_customers_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics {
                handle: Arc::new(handle),
                path: config.path.clone(),
            })
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics) -> Router {
    let path = metrics.path.clone();

    Router::new()
        .route(&path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

fn cache_metric_names() -> &'static CacheMetricNames {
    CACHE_METRICS.get_or_init(CacheMetricNames::default)
}

/// Record the outcome of a customer repository operation
pub fn record_cache_operation(operation: &'static str, outcome: &'static str) {
    count_cache_operation(cache_metric_names(), operation, outcome);
}

pub fn set_customer_cache_size(size: usize) {
    gauge_cache_size(cache_metric_names(), size);
}

fn count_cache_operation(
    names: &CacheMetricNames,
    operation: &'static str,
    outcome: &'static str,
) {
    if names.enabled {
        counter!(
            names.operations.clone(),
            "operation" => operation,
            "outcome" => outcome
        )
        .increment(1);
    }
}

fn gauge_cache_size(names: &CacheMetricNames, size: usize) {
    if names.enabled {
        gauge!(names.entries.clone()).set(size as f64);
    }
}

/// Collapse customer IDs so unmatched paths do not explode label cardinality
fn sanitize_path(path: &str) -> String {
    let path = CUSTOMER_SEGMENT.replace_all(path, "${1}{id}");

    if path.len() > 50 {
        path.chars().take(50).collect()
    } else {
        path.into_owned()
    }
}
