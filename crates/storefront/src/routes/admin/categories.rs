//! Category management.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use ampere_core::CategoryId;

use crate::db::CategoryRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, ValidatedJson};
use crate::models::{CascadeSummary, Category, CategoryInput, CategoryWithSubcategories};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/categories", get(list).post(create))
        .route("/api/admin/categories/{id}", put(update).delete(delete))
}

async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithSubcategories>>> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_subcategories()
        .await?;
    Ok(Json(categories))
}

async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<(StatusCode, Json<Category>)> {
    let category = CategoryRepository::new(state.pool()).create(&input).await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        category_id = %category.id,
        name = %category.name,
        "category created"
    );

    Ok((StatusCode::CREATED, Json(category)))
}

async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<Json<Category>> {
    let category = CategoryRepository::new(state.pool())
        .update(id, &input)
        .await?;

    tracing::info!(target: "audit", admin_id = %admin.id, category_id = %id, "category updated");

    Ok(Json(category))
}

/// Delete a category with all of its subcategories and their products.
async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CascadeSummary>> {
    let removed = CategoryRepository::new(state.pool())
        .delete_cascade(id)
        .await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        category_id = %id,
        subcategories = removed.subcategories,
        products = removed.products,
        "category deleted"
    );

    Ok(Json(removed))
}
