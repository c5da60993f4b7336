//! Favorites for signed-in users.
//!
//! Guests get 401 on every endpoint; clients keep their favorites locally in
//! that case and push them with `PUT` after sign-in.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use ampere_core::{FavoritesState, ProductId};

use crate::db::FavoriteRepository;
use crate::error::Result;
use crate::middleware::{JsonBody, RequireAuth};
use crate::state::AppState;

/// Upper bound on a replaced favorites list.
const MAX_FAVORITES: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/favorites", get(list).put(replace))
        .route("/api/favorites/{product_id}", post(add).delete(remove))
}

/// Favorites as returned to clients.
#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub product_ids: FavoritesState,
}

/// Full replacement of the favorites list.
#[derive(Debug, Deserialize)]
pub struct ReplaceFavoritesRequest {
    pub product_ids: Vec<ProductId>,
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<FavoritesResponse>> {
    let product_ids = FavoriteRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(FavoritesResponse { product_ids }))
}

/// Replace the stored list with the client's. Unknown products are dropped.
async fn replace(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(body): JsonBody<ReplaceFavoritesRequest>,
) -> Result<Json<FavoritesResponse>> {
    let wanted: FavoritesState = body.product_ids.into_iter().take(MAX_FAVORITES).collect();
    let product_ids = FavoriteRepository::new(state.pool())
        .replace(user.id, &wanted)
        .await?;
    Ok(Json(FavoritesResponse { product_ids }))
}

async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<FavoritesResponse>> {
    let repo = FavoriteRepository::new(state.pool());
    repo.add(user.id, product_id).await?;
    let product_ids = repo.list(user.id).await?;
    Ok(Json(FavoritesResponse { product_ids }))
}

async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<ProductId>,
) -> Result<Json<FavoritesResponse>> {
    let repo = FavoriteRepository::new(state.pool());
    repo.remove(user.id, product_id).await?;
    let product_ids = repo.list(user.id).await?;
    Ok(Json(FavoritesResponse { product_ids }))
}
