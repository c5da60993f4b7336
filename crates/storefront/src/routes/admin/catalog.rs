//! Upstream catalog cache control.

use axum::{Json, Router, extract::State, routing::post};
use serde_json::{Value, json};

use crate::middleware::RequireAdmin;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/catalog/invalidate", post(invalidate))
}

/// Drop every cached upstream response; the next request refetches.
async fn invalidate(RequireAdmin(admin): RequireAdmin, State(state): State<AppState>) -> Json<Value> {
    state.catalog().invalidate_all();
    tracing::info!(target: "audit", admin_id = %admin.id, "catalog cache invalidated");
    Json(json!({ "ok": true }))
}
