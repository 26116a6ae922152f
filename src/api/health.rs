//! Health check endpoints for Kubernetes liveness and readiness checks

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use super::state::AppState;
use crate::api::types::Json;

/// Health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Returns 200 while the process is serving requests
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
    };

    (StatusCode::OK, Json(response))
}

/// Ready once the customer cache has completed its initial load
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let cache_check = check_customer_cache(&state);
    let status = cache_check.status;

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![cache_check]),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

fn check_customer_cache(state: &AppState) -> HealthCheck {
    match state.cache.get() {
        Some(map) => HealthCheck {
            name: "customer_cache".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!("{} customers cached", map.len())),
        },
        None => HealthCheck {
            name: "customer_cache".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some("Customer cache not loaded".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::domain::{Customer, CustomerId, Storage};
    use crate::infrastructure::customer::CustomerCache;
    use crate::infrastructure::storage::InMemoryStorage;

    fn state_over(cache: Arc<CustomerCache>, store: Arc<dyn Storage<Customer>>) -> AppState {
        AppState::new(cache, store, Duration::from_secs(1))
    }

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_health_response_without_checks() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0".to_string(),
            checks: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(!json.contains("checks"));
    }

    #[tokio::test]
    async fn test_cache_check_before_and_after_load() {
        let cache = Arc::new(CustomerCache::new());
        let store: Arc<dyn Storage<Customer>> =
            Arc::new(InMemoryStorage::with_entities(vec![Customer::new(
                CustomerId::new("ALFKI").unwrap(),
                "Alfreds Futterkiste",
            )]));
        let state = state_over(Arc::clone(&cache), Arc::clone(&store));

        let before = check_customer_cache(&state);
        assert_eq!(before.status, HealthStatus::Unhealthy);

        cache.load(store.as_ref()).await.unwrap();

        let after = check_customer_cache(&state);
        assert_eq!(after.status, HealthStatus::Healthy);
        assert_eq!(after.message.as_deref(), Some("1 customers cached"));
    }
}
