//! Upstream product data, served through the catalog cache.
//!
//! These endpoints never fail because of the upstream API. The `source`
//! field of the response tells clients whether data is live, cached, stale
//! or mock.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::catalog::CatalogResponse;
use crate::error::{AppError, Result};
use crate::state::AppState;

const MAX_NOMENCLATURE_ID_LENGTH: usize = 64;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/products", get(products))
        .route("/api/catalog/nomenclatures/{id}", get(nomenclature_products))
}

async fn products(State(state): State<AppState>) -> Json<CatalogResponse> {
    Json(state.catalog().products().await)
}

async fn nomenclature_products(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogResponse>> {
    if !is_valid_nomenclature_id(&id) {
        return Err(AppError::BadRequest("Invalid nomenclature id".to_string()));
    }
    Ok(Json(state.catalog().products_by_nomenclature(&id).await))
}

/// Nomenclature ids are short slugs: ASCII letters, digits, `-` and `_`.
fn is_valid_nomenclature_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_NOMENCLATURE_ID_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nomenclature_id_validation() {
        assert!(is_valid_nomenclature_id("smartphones"));
        assert!(is_valid_nomenclature_id("tv_audio-2"));
        assert!(!is_valid_nomenclature_id(""));
        assert!(!is_valid_nomenclature_id("a/b"));
        assert!(!is_valid_nomenclature_id("phones?x=1"));
        assert!(!is_valid_nomenclature_id(&"x".repeat(65)));
    }
}
