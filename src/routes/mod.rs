use axum::{http::StatusCode, middleware, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
    services::RecommendationService,
};

pub mod products;
pub mod recommendations;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: RecommendationService,
}

impl AppState {
    pub fn new(service: RecommendationService) -> Self {
        Self { service }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/products", get(products::list))
        .route("/products/:sku", get(products::get_product))
        .route("/recommendations", get(recommendations::recommend))
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
