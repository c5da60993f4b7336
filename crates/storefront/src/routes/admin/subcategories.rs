//! Subcategory management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};
use serde::Deserialize;

use ampere_core::{CategoryId, SubcategoryId};

use crate::db::SubcategoryRepository;
use crate::error::Result;
use crate::middleware::{RequireAdmin, ValidatedJson};
use crate::models::{CascadeSummary, Subcategory, SubcategoryInput};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/subcategories", get(list).post(create))
        .route("/api/admin/subcategories/{id}", put(update).delete(delete))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub category_id: Option<CategoryId>,
}

async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Subcategory>>> {
    let subcategories = SubcategoryRepository::new(state.pool())
        .list(query.category_id)
        .await?;
    Ok(Json(subcategories))
}

async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    ValidatedJson(input): ValidatedJson<SubcategoryInput>,
) -> Result<(StatusCode, Json<Subcategory>)> {
    let subcategory = SubcategoryRepository::new(state.pool())
        .create(&input)
        .await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        subcategory_id = %subcategory.id,
        category_id = %subcategory.category_id,
        "subcategory created"
    );

    Ok((StatusCode::CREATED, Json(subcategory)))
}

async fn update(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SubcategoryId>,
    ValidatedJson(input): ValidatedJson<SubcategoryInput>,
) -> Result<Json<Subcategory>> {
    let subcategory = SubcategoryRepository::new(state.pool())
        .update(id, &input)
        .await?;

    tracing::info!(target: "audit", admin_id = %admin.id, subcategory_id = %id, "subcategory updated");

    Ok(Json(subcategory))
}

/// Delete a subcategory and its products.
async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SubcategoryId>,
) -> Result<Json<CascadeSummary>> {
    let removed = SubcategoryRepository::new(state.pool())
        .delete_cascade(id)
        .await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        subcategory_id = %id,
        products = removed.products,
        "subcategory deleted"
    );

    Ok(Json(removed))
}
