//! Product endpoints
//!
//! Each handler runs exactly one unit of work through the gateway and
//! suspends until the worker pool hands the result back.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};

use crate::http::error::ApiError;
use crate::http::extractors::{ProductBody, ProductIdPath};
use crate::http::server::AppState;
use crate::models::Product;

/// GET /products - list every product
async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.gateway.find_all().await?;
    Ok(Json(products))
}

/// GET /products/{id} - a single product, or the empty record if absent
async fn get_product(
    State(state): State<Arc<AppState>>,
    ProductIdPath(id): ProductIdPath,
) -> Result<Json<Product>, ApiError> {
    let product = state.gateway.find_by_id(id).await?;
    if product.is_none() {
        tracing::debug!(id, "product not found, returning empty record");
    }
    Ok(Json(product.unwrap_or_default()))
}

/// POST /products - persist a new product
async fn create_product(
    State(state): State<Arc<AppState>>,
    ProductBody(product): ProductBody,
) -> Result<Json<Product>, ApiError> {
    let product = state.gateway.persist(product).await?;
    Ok(Json(product))
}

/// Product routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/{id}", get(get_product))
}
