//! User role management.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use serde::Deserialize;

use ampere_core::{UserId, UserRole};

use crate::db::{Page, Pagination, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::{JsonBody, RequireAdmin};
use crate::models::User;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/users", get(list))
        .route("/api/admin/users/{id}/role", patch(set_role))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: UserRole,
}

async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<User>>> {
    let users = UserRepository::new(state.pool())
        .list(Pagination::new(query.page, query.per_page))
        .await?;
    Ok(Json(users))
}

/// Change a user's role. Admins can't demote themselves.
async fn set_role(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
    JsonBody(body): JsonBody<RoleUpdate>,
) -> Result<Json<User>> {
    if id == admin.id && body.role != UserRole::Admin {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".to_string(),
        ));
    }

    let user = UserRepository::new(state.pool())
        .set_role(id, body.role)
        .await?;

    tracing::info!(
        target: "audit",
        admin_id = %admin.id,
        user_id = %user.id,
        role = %user.role,
        "user role changed"
    );

    Ok(Json(user))
}
