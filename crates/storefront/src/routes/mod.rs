//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready
//!
//! # Catalog (database)
//! GET  /api/categories                 - Categories with subcategories
//! GET  /api/categories/{id}            - One category
//! GET  /api/subcategories/{id}         - Subcategory with its products
//! GET  /api/products                   - Filtered, paginated products
//! GET  /api/products/{id}              - One product
//!
//! # Catalog (upstream, cached)
//! GET  /api/catalog/products
//! GET  /api/catalog/nomenclatures/{id}
//!
//! # Auth (rate limited)
//! POST /api/auth/register | login | logout
//! GET  /api/auth/me
//! GET  /api/auth/oauth/login | callback
//!
//! # Cart (session)
//! GET|DELETE /api/cart
//! POST       /api/cart/items
//! PUT|DELETE /api/cart/items/{product_id}
//!
//! # Favorites (requires auth)
//! GET|PUT     /api/favorites
//! POST|DELETE /api/favorites/{product_id}
//!
//! # Orders
//! POST /api/orders                     - Checkout (guests allowed)
//! GET  /api/orders                     - Current user's orders
//! GET  /api/orders/{order_number}
//!
//! # Back-office (requires admin)
//! /api/admin/...                       - See [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod favorites;
pub mod health;
pub mod oauth;
pub mod orders;
pub mod upstream;

use axum::Router;

use crate::middleware::auth_rate_limiter;
use crate::state::AppState;

/// Sign-in routes, behind the per-IP rate limiter.
fn auth_routes() -> Router<AppState> {
    let routes = auth::router().merge(oauth::router());
    match auth_rate_limiter() {
        Some(limiter) => routes.layer(limiter),
        None => {
            tracing::warn!("Auth rate limiter disabled: invalid quota");
            routes
        }
    }
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(catalog::router())
        .merge(upstream::router())
        .merge(auth_routes())
        .merge(cart::router())
        .merge(favorites::router())
        .merge(orders::router())
        .merge(admin::router())
}
