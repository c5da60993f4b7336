//! Checkout and order history.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use validator::Validate;

use ampere_core::{Cart, CartItem, Money, PaymentMethod};

use crate::db::OrderRepository;
use crate::db::orders::NewOrder;
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAuth, ValidatedJson};
use crate::models::{CustomerInfo, Order, session_keys};
use crate::routes::cart::load_cart;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list).post(checkout))
        .route("/api/orders/{order_number}", get(show))
}

/// Checkout request body.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(nested)]
    pub customer: CustomerInfo,
    pub payment_method: PaymentMethod,
    /// Lines to order; the session cart is used when absent.
    pub items: Option<Vec<CartItem>>,
    #[validate(length(max = 1000, message = "Comment must be at most 1000 characters"))]
    pub comment: Option<String>,
}

/// Place an order. Guests may check out; the order is then not linked to
/// any account.
#[instrument(skip_all)]
async fn checkout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    ValidatedJson(body): ValidatedJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<Order>)> {
    let from_session = body.items.is_none();
    let cart = match body.items {
        Some(items) => items.into_iter().collect::<Cart>(),
        None => load_cart(&session).await,
    };

    let new_order = NewOrder {
        user_id: user.as_ref().map(|u| u.id),
        customer: body.customer,
        payment_method: body.payment_method,
        comment: body
            .comment
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty()),
        currency: state.config().catalog.default_currency,
        cart,
    };

    let order = OrderRepository::new(state.pool())
        .create_from_checkout(&new_order)
        .await?;

    if from_session {
        session.remove::<Cart>(session_keys::CART).await?;
    }

    tracing::info!(
        order_number = %order.order_number,
        user_id = ?order.user_id,
        total = %Money::new(order.total, order.currency),
        lines = order.items.len(),
        "Order placed"
    );

    Ok((StatusCode::CREATED, Json(order)))
}

async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

/// One of the current user's orders. Other users' orders are reported as
/// missing.
async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_number): Path<String>,
) -> Result<Json<Order>> {
    let order = OrderRepository::new(state.pool())
        .get_by_number(&order_number)
        .await?
        .filter(|order| order.user_id == Some(user.id))
        .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
    Ok(Json(order))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(email: &str) -> CheckoutRequest {
        serde_json::from_value(serde_json::json!({
            "customer": {
                "name": "Anna Petrova",
                "email": email,
                "phone": "+7 900 123-45-67",
                "address": "Moscow, Tverskaya 1"
            },
            "payment_method": "CARD_ON_DELIVERY",
            "items": [{"product_id": 3, "quantity": 1}]
        }))
        .unwrap()
    }

    #[test]
    fn test_checkout_request_valid() {
        let req = request("anna@example.com");
        assert!(req.validate().is_ok());
        assert_eq!(req.payment_method, PaymentMethod::CardOnDelivery);
        assert_eq!(req.items.unwrap().len(), 1);
    }

    #[test]
    fn test_checkout_request_validates_customer() {
        let errors = request("not-an-email").validate().unwrap_err();
        let details = crate::error::validation_details(&errors);
        assert!(details.contains_key("customer.email"));
    }
}
