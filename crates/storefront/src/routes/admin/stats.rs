//! Dashboard counters.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::db::categories::CatalogCounts;
use crate::db::{CategoryRepository, OrderRepository, UserRepository};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::OrderStats;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/stats", get(stats))
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub catalog: CatalogCounts,
    pub orders: OrderStats,
    pub users: i64,
}

async fn stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>> {
    let pool = state.pool();
    let categories = CategoryRepository::new(pool);
    let order_repo = OrderRepository::new(pool);
    let user_repo = UserRepository::new(pool);
    let (catalog, orders, users) =
        tokio::try_join!(categories.counts(), order_repo.stats(), user_repo.count())?;

    Ok(Json(DashboardStats {
        catalog,
        orders,
        users,
    }))
}
