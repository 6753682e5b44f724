use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::{
    db::ProductRepository,
    middleware::request_id::{make_span_with_request_id, request_id_middleware},
};

pub mod products;

/// Shared application state
///
/// The repository is constructed once at startup and injected here; handlers
/// never reach for a global store handle.
#[derive(Clone)]
pub struct AppState {
    pub products: Arc<dyn ProductRepository>,
}

impl AppState {
    pub fn new(products: Arc<dyn ProductRepository>) -> Self {
        Self { products }
    }
}

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/amazon", post(products::create))
        .route(
            "/amazon/:asin",
            get(products::show)
                .put(products::replace)
                .patch(products::partial_update),
        )
        .route("/amazon/:asin/delete", patch(products::delete))
        .route("/amazon/:asin/undelete", patch(products::undelete))
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
