//! Telemetry settings: OTLP span export and Prometheus metrics

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub tracing: TracingConfig,
    pub metrics: MetricsConfig,
}

/// OTLP span export, off by default
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub otlp_endpoint: String,
    pub service_name: String,
    pub sampling_ratio: f64,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            otlp_endpoint: "http://localhost:4317".to_string(),
            service_name: env!("CARGO_PKG_NAME").to_string(),
            sampling_ratio: 1.0,
        }
    }
}

impl TracingConfig {
    /// Endpoint spans are exported to, or `None` when export is off or no
    /// endpoint is set
    pub fn export_endpoint(&self) -> Option<&str> {
        let endpoint = self.otlp_endpoint.trim();
        (self.enabled && !endpoint.is_empty()).then_some(endpoint)
    }

    /// Sampling ratio limited to `0.0..=1.0`; a NaN ratio samples nothing
    pub fn effective_sampling_ratio(&self) -> f64 {
        if self.sampling_ratio.is_nan() {
            0.0
        } else {
            self.sampling_ratio.clamp(0.0, 1.0)
        }
    }
}

/// Prometheus exposition and the customer cache metrics
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
    /// Prepended to the cache metric names; empty for none
    pub prefix: String,
    /// Record cache operation counters and the cache size gauge
    pub cache_metrics: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
            prefix: "northwind".to_string(),
            cache_metrics: true,
        }
    }
}

impl MetricsConfig {
    /// Resolved names for the cache metrics under this configuration
    pub fn cache_metric_names(&self) -> CacheMetricNames {
        CacheMetricNames {
            enabled: self.cache_metrics,
            operations: self.metric_name("customer_cache_operations_total"),
            entries: self.metric_name("customer_cache_entries"),
        }
    }

    fn metric_name(&self, name: &str) -> String {
        let prefix = self.prefix.trim().trim_end_matches('_');

        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}_{}", prefix, name)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheMetricNames {
    pub enabled: bool,
    pub operations: String,
    pub entries: String,
}

impl Default for CacheMetricNames {
    fn default() -> Self {
        MetricsConfig::default().cache_metric_names()
    }
}
