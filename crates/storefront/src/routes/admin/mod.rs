//! Back-office JSON API under `/api/admin`.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin), so
//! anonymous callers get 401 and non-admins 403 before any database write.
//! Mutations emit an audit event on the `audit` tracing target.

pub mod catalog;
pub mod categories;
pub mod orders;
pub mod products;
pub mod stats;
pub mod subcategories;
pub mod users;

use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(stats::router())
        .merge(categories::router())
        .merge(subcategories::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(users::router())
        .merge(catalog::router())
}
