//! Customer REST endpoints

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query},
    http::{header, request::Parts, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use serde::Deserialize;
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{Customer, CustomerRepository};

/// Repository opened for the current request
pub struct Customers(pub Arc<dyn CustomerRepository>);

impl FromRequestParts<AppState> for Customers {
    type Rejection = ApiError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let repository = state.customers.open().await?;
        Ok(Customers(repository))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListCustomersQuery {
    pub country: Option<String>,
}

pub fn create_customers_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers).post(create_customer))
        .route(
            "/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

/// GET /api/customers
pub async fn list_customers(
    Customers(customers): Customers,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let all = customers.retrieve_all().await?;

    let filtered = match query.country.as_deref().map(str::trim) {
        Some(country) if !country.is_empty() => {
            debug!(country, "Listing customers by country");
            all.into_iter().filter(|c| c.is_in_country(country)).collect()
        }
        _ => {
            debug!("Listing all customers");
            all
        }
    };

    Ok(Json(filtered))
}

/// GET /api/customers/{id}
pub async fn get_customer(
    Customers(customers): Customers,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    debug!(customer_id = %id, "Getting customer");

    let customer = customers
        .retrieve(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Customer '{}' not found", id)))?;

    Ok(Json(customer))
}

/// POST /api/customers
pub async fn create_customer(
    Customers(customers): Customers,
    Json(customer): Json<Customer>,
) -> Result<impl IntoResponse, ApiError> {
    debug!(customer_id = %customer.customer_id, "Creating customer");

    let created = customers.create(customer).await?;
    let location = format!("/api/customers/{}", created.customer_id.to_route_segment());

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(created),
    ))
}

/// PUT /api/customers/{id}
pub async fn update_customer(
    Customers(customers): Customers,
    Path(id): Path<String>,
    Json(customer): Json<Customer>,
) -> Result<StatusCode, ApiError> {
    debug!(customer_id = %id, "Updating customer");

    customers.update(&id, customer).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/customers/{id}
pub async fn delete_customer(
    Customers(customers): Customers,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    debug!(customer_id = %id, "Deleting customer");

    customers.delete(&id).await?;

    Ok(StatusCode::NO_CONTENT)
}
