//! Session cart.
//!
//! The session only stores product ids and quantities. Every read resolves
//! them against the current catalog, so prices are never stale and deleted
//! products silently drop out.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use validator::Validate;

use ampere_core::{Cart, Currency, ProductId};

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::ValidatedJson;
use crate::models::{Product, session_keys};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/cart", get(show).delete(clear))
        .route("/api/cart/items", post(add_item))
        .route(
            "/api/cart/items/{product_id}",
            put(update_item).delete(remove_item),
        )
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    #[validate(range(min = 1, max = 99, message = "Quantity must be 1-99"))]
    pub quantity: u32,
}

/// Quantity update; zero removes the line.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(range(max = 99, message = "Quantity must be 0-99"))]
    pub quantity: u32,
}

/// A cart line resolved against the catalog.
#[derive(Debug, Serialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub code: String,
    pub name: String,
    pub image: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    /// Units currently in stock; lines above this will fail at checkout.
    pub available: i32,
}

/// The cart as clients see it.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    pub total_quantity: u32,
    pub subtotal: Decimal,
    pub currency: Currency,
}

/// Read the cart from the session; a missing or unreadable cart is empty.
pub(crate) async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

pub(crate) async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Resolve cart lines, dropping products that no longer exist.
fn cart_view(cart: &Cart, products: &[Product], currency: Currency) -> CartView {
    let items: Vec<CartLine> = cart
        .items()
        .iter()
        .filter_map(|item| {
            let product = products.iter().find(|p| p.id == item.product_id)?;
            let unit_price = product.effective_price();
            Some(CartLine {
                product_id: product.id,
                code: product.code.clone(),
                name: product.name.clone(),
                image: product.images.first().cloned(),
                quantity: item.quantity,
                unit_price,
                subtotal: unit_price * Decimal::from(item.quantity),
                available: product.stock,
            })
        })
        .collect();

    CartView {
        total_quantity: items.iter().map(|line| line.quantity).sum(),
        subtotal: items.iter().map(|line| line.subtotal).sum(),
        items,
        currency,
    }
}

async fn render(state: &AppState, session: &Session, cart: &Cart) -> Result<Json<CartView>> {
    let products = ProductRepository::new(state.pool())
        .get_many(&cart.product_ids())
        .await?;
    let view = cart_view(cart, &products, state.config().catalog.default_currency);

    // Forget lines whose product was deleted.
    if view.items.len() != cart.items().len() {
        let kept: Cart = cart
            .items()
            .iter()
            .filter(|item| products.iter().any(|p| p.id == item.product_id))
            .copied()
            .collect();
        save_cart(session, &kept).await?;
    }

    Ok(Json(view))
}

async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    let cart = load_cart(&session).await;
    render(&state, &session, &cart).await
}

async fn add_item(
    State(state): State<AppState>,
    session: Session,
    ValidatedJson(body): ValidatedJson<AddItemRequest>,
) -> Result<Json<CartView>> {
    ProductRepository::new(state.pool())
        .get(body.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

    let mut cart = load_cart(&session).await;
    cart.add(body.product_id, body.quantity);
    save_cart(&session, &cart).await?;

    render(&state, &session, &cart).await
}

async fn update_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
    ValidatedJson(body): ValidatedJson<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    if !cart.set_quantity(product_id, body.quantity) && body.quantity > 0 {
        return Err(AppError::NotFound("Cart item".to_string()));
    }
    save_cart(&session, &cart).await?;

    render(&state, &session, &cart).await
}

async fn remove_item(
    State(state): State<AppState>,
    session: Session,
    Path(product_id): Path<ProductId>,
) -> Result<Json<CartView>> {
    let mut cart = load_cart(&session).await;
    if cart.remove(product_id) {
        save_cart(&session, &cart).await?;
    }
    render(&state, &session, &cart).await
}

async fn clear(State(state): State<AppState>, session: Session) -> Result<Json<CartView>> {
    session.remove::<Cart>(session_keys::CART).await?;
    Ok(Json(cart_view(
        &Cart::new(),
        &[],
        state.config().catalog.default_currency,
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Utc;

    use ampere_core::SubcategoryId;

    use super::*;

    fn product(id: i32, price: i64, discounted: Option<i64>) -> Product {
        Product {
            id: ProductId::new(id),
            code: format!("P-{id}"),
            name: format!("Product {id}"),
            description: None,
            price: Decimal::from(price),
            discounted_price: discounted.map(Decimal::from),
            stock: 4,
            images: vec![format!("https://cdn.ampere.example/{id}.jpg")],
            subcategory_id: SubcategoryId::new(1),
            specifications: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_view_prices_lines() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 1);

        let view = cart_view(
            &cart,
            &[product(1, 1000, Some(900)), product(2, 500, None)],
            Currency::Rub,
        );

        assert_eq!(view.items.len(), 2);
        assert_eq!(view.items[0].unit_price, Decimal::from(900));
        assert_eq!(view.items[0].subtotal, Decimal::from(1800));
        assert_eq!(view.total_quantity, 3);
        assert_eq!(view.subtotal, Decimal::from(2300));
    }

    #[test]
    fn test_cart_view_skips_missing_products() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 1);
        cart.add(ProductId::new(7), 3);

        let view = cart_view(&cart, &[product(1, 100, None)], Currency::Rub);
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.total_quantity, 1);
    }

    #[test]
    fn test_quantity_limits() {
        let ok: AddItemRequest =
            serde_json::from_value(serde_json::json!({"product_id": 1, "quantity": 3})).unwrap();
        assert!(ok.validate().is_ok());

        let zero: AddItemRequest =
            serde_json::from_value(serde_json::json!({"product_id": 1, "quantity": 0})).unwrap();
        assert!(zero.validate().is_err());

        let remove: UpdateItemRequest =
            serde_json::from_value(serde_json::json!({"quantity": 0})).unwrap();
        assert!(remove.validate().is_ok());
    }
}
