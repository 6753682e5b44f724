use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Product, ProductInput, ProductPatch},
    routes::AppState,
    services::products,
};

/// Unwraps a JSON body, turning decoder failures into a 400
fn body<T>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

/// POST /amazon
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Product>)> {
    let input = body(payload)?;

    tracing::info!(
        request_id = %request_id,
        asin = input.asin.as_deref().unwrap_or_default(),
        "Creating product"
    );

    let product = products::create_product(state.products.as_ref(), input).await?;

    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /amazon/:asin
pub async fn show(
    State(state): State<Arc<AppState>>,
    Path(asin): Path<String>,
) -> AppResult<Json<Product>> {
    let product = products::get_product(state.products.as_ref(), &asin).await?;
    Ok(Json(product))
}

/// PUT /amazon/:asin
pub async fn replace(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(asin): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> AppResult<Json<Product>> {
    tracing::info!(request_id = %request_id, asin = %asin, "Replacing product");

    let product = products::replace_product(state.products.as_ref(), &asin, body(payload)).await?;

    Ok(Json(product))
}

/// PATCH /amazon/:asin
pub async fn partial_update(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(asin): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> AppResult<Json<Product>> {
    tracing::info!(request_id = %request_id, asin = %asin, "Patching product");

    let product = products::patch_product(state.products.as_ref(), &asin, body(payload)).await?;

    Ok(Json(product))
}

/// PATCH /amazon/:asin/delete
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(asin): Path<String>,
) -> AppResult<StatusCode> {
    tracing::info!(request_id = %request_id, asin = %asin, "Deleting product");

    products::delete_product(state.products.as_ref(), &asin).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /amazon/:asin/undelete
pub async fn undelete(
    State(state): State<Arc<AppState>>,
    Extension(request_id): Extension<RequestId>,
    Path(asin): Path<String>,
) -> AppResult<Json<Product>> {
    tracing::info!(request_id = %request_id, asin = %asin, "Restoring product");

    let product = products::undelete_product(state.products.as_ref(), &asin).await?;

    Ok(Json(product))
}
