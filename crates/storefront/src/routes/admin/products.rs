//! Product management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use ampere_core::ProductId;

use crate::db::products::ProductFilter;
use crate::db::{Page, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, ValidatedJson};
use crate::models::{Product, ProductInput};
use crate::routes::catalog::ProductQuery;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/products", get(list).post(create))
        .route(
            "/api/admin/products/{id}",
            get(show).put(update).delete(delete),
        )
}

async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let filter = ProductFilter::from(query);
    let page = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page))
}

async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    Ok(Json(product))
}

async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> Result<(StatusCode, Json<Product>)> {
    let product = ProductRepository::new(state.pool()).create(&input).await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        product_id = %product.id,
        code = %product.code,
        "product created"
    );

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .update(id, &input)
        .await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        product_id = %id,
        code = %product.code,
        price = %product.price,
        stock = product.stock,
        "product updated"
    );

    Ok(Json(product))
}

async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;

    tracing::info!(target: "audit", admin_id = %admin.id, product_id = %id, "product deleted");

    Ok(StatusCode::NO_CONTENT)
}
