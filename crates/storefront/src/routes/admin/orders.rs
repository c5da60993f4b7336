//! Order management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;

use ampere_core::{OrderId, OrderStatus};

use crate::db::orders::OrderFilter;
use crate::db::{OrderRepository, Page, Pagination};
use crate::error::{AppError, Result};
use crate::middleware::{JsonBody, RequireAdmin};
use crate::models::Order;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/orders", get(list))
        .route("/api/admin/orders/{id}", get(show))
        .route("/api/admin/orders/{id}/status", patch(update_status))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: OrderStatus,
}

async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<Order>>> {
    let filter = OrderFilter {
        status: query.status,
        pagination: Pagination::new(query.page, query.per_page),
    };
    let page = OrderRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(page))
}

async fn show(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
    Ok(Json(order))
}

/// Move an order along its lifecycle. Cancelling returns stock.
async fn update_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    JsonBody(body): JsonBody<StatusUpdate>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());
    let current = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;

    if !current.status.can_transition_to(body.status) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {} to {}",
            current.status, body.status
        )));
    }

    let order = repo.update_status(id, current.status, body.status).await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        order_number = %order.order_number,
        from = %current.status,
        to = %order.status,
        "order status changed"
    );

    Ok(Json(order))
}
