use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Product, Role},
};

use super::AppState;

const DEFAULT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    limit: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    /// Matches before the limit was applied
    pub total: usize,
    pub count: usize,
    pub products: Vec<Product>,
}

/// Handler for product listing; an unknown role yields an empty list
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ProductsQuery>,
) -> AppResult<Json<ProductsResponse>> {
    let limit = match params.limit.as_deref().map(str::trim) {
        None | Some("") => DEFAULT_LIMIT,
        Some(raw) => raw
            .parse::<usize>()
            .map_err(|_| AppError::InvalidInput("limit must be a non-negative integer".to_string()))?,
    };

    let catalog = state.service.catalog();
    let matching: Vec<&Product> = match params.role.as_deref().filter(|r| !r.trim().is_empty()) {
        None => catalog.products().iter().collect(),
        Some(raw) => match raw.parse::<Role>() {
            Ok(role) => catalog.by_role(role).collect(),
            Err(_) => {
                tracing::debug!(role = %raw, "Unknown role requested");
                Vec::new()
            }
        },
    };

    let products: Vec<Product> = matching.iter().take(limit).map(|p| (*p).clone()).collect();

    Ok(Json(ProductsResponse {
        total: matching.len(),
        count: products.len(),
        products,
    }))
}

/// Handler for a single product
pub async fn get_product(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> AppResult<Json<Product>> {
    state
        .service
        .catalog()
        .get(&sku)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}
