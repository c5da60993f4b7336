//! Public catalog backed by the local database.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::{Deserialize, Serialize};

use ampere_core::{CategoryId, ProductId, SubcategoryId};

use crate::db::products::ProductFilter;
use crate::db::{CategoryRepository, Page, Pagination, ProductRepository, SubcategoryRepository};
use crate::error::{AppError, Result};
use crate::models::{CategoryWithSubcategories, Product, Subcategory};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list_categories))
        .route("/api/categories/{id}", get(show_category))
        .route("/api/subcategories/{id}", get(show_subcategory))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(show_product))
}

/// Query parameters for product listings.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub subcategory_id: Option<SubcategoryId>,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            subcategory: query.subcategory_id,
            category: query.category_id,
            search: query.search.filter(|s| !s.trim().is_empty()),
            in_stock: query.in_stock,
            pagination: Pagination::new(query.page, query.per_page),
        }
    }
}

/// A subcategory with its products.
#[derive(Debug, Serialize)]
pub struct SubcategoryDetail {
    #[serde(flatten)]
    pub subcategory: Subcategory,
    pub products: Vec<Product>,
}

async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryWithSubcategories>>> {
    let categories = CategoryRepository::new(state.pool())
        .list_with_subcategories()
        .await?;
    Ok(Json(categories))
}

async fn show_category(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<CategoryWithSubcategories>> {
    let category = CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Category".to_string()))?;
    let subcategories = SubcategoryRepository::new(state.pool())
        .list(Some(id))
        .await?;

    Ok(Json(CategoryWithSubcategories {
        category,
        subcategories,
    }))
}

async fn show_subcategory(
    State(state): State<AppState>,
    Path(id): Path<SubcategoryId>,
) -> Result<Json<SubcategoryDetail>> {
    let subcategory = SubcategoryRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Subcategory".to_string()))?;

    let filter = ProductFilter {
        subcategory: Some(id),
        pagination: Pagination::new(None, Some(Pagination::MAX_PER_PAGE)),
        ..ProductFilter::default()
    };
    let products = ProductRepository::new(state.pool()).list(&filter).await?;

    Ok(Json(SubcategoryDetail {
        subcategory,
        products: products.items,
    }))
}

async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Page<Product>>> {
    let filter = ProductFilter::from(query);
    let page = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page))
}

async fn show_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;
    Ok(Json(product))
}
