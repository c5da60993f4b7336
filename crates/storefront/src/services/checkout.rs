//! Checkout pricing and order numbering.
//!
//! Everything here is pure; the transaction that locks stock and writes the
//! order lives in [`crate::db::OrderRepository::create_from_checkout`].

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

use ampere_core::{Cart, Currency, Money, ProductId};

use crate::db::RepositoryError;
use crate::models::Product;

/// Characters used for the random order number suffix (no 0/O, 1/I).
const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Neither the request nor the session carried any items.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line refers to a product that no longer exists.
    #[error("product {0} is no longer available")]
    ProductUnavailable(ProductId),

    /// Not enough stock for a cart line.
    #[error("only {available} of \"{name}\" left in stock, {requested} requested")]
    InsufficientStock {
        product_id: ProductId,
        name: String,
        requested: u32,
        available: i32,
    },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// A priced order line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_code: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Price every cart line against current product data.
///
/// The unit price is the discounted price when present, else the regular
/// price. Lines keep the cart's order.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart,
/// `CheckoutError::ProductUnavailable` when a product is missing and
/// `CheckoutError::InsufficientStock` when a line asks for more than is left.
pub fn build_order_lines(
    cart: &Cart,
    products: &[Product],
    currency: Currency,
) -> Result<Vec<OrderLine>, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    cart.items()
        .iter()
        .map(|item| {
            let product = products
                .iter()
                .find(|p| p.id == item.product_id)
                .ok_or(CheckoutError::ProductUnavailable(item.product_id))?;

            let enough = i64::from(product.stock) >= i64::from(item.quantity);
            if !enough {
                return Err(CheckoutError::InsufficientStock {
                    product_id: product.id,
                    name: product.name.clone(),
                    requested: item.quantity,
                    available: product.stock,
                });
            }

            let unit_price = Money::new(product.effective_price(), currency);
            Ok(OrderLine {
                product_id: product.id,
                product_code: product.code.clone(),
                product_name: product.name.clone(),
                quantity: item.quantity,
                unit_price,
                subtotal: unit_price.times(item.quantity),
            })
        })
        .collect()
}

/// Sum of line subtotals.
#[must_use]
pub fn order_total(lines: &[OrderLine], currency: Currency) -> Money {
    let amount = lines.iter().map(|line| line.subtotal.amount).sum();
    Money::new(amount, currency)
}

/// Generate an order number of the form `AMP-YYYYMMDD-XXXXXX`.
#[must_use]
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_ALPHABET.len());
            ORDER_NUMBER_ALPHABET
                .get(idx)
                .map_or('X', |b| char::from(*b))
        })
        .collect();

    format!("AMP-{}-{suffix}", now.format("%Y%m%d"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;
    use std::str::FromStr;

    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use ampere_core::SubcategoryId;

    use super::*;

    fn product(id: i32, price: &str, discounted: Option<&str>, stock: i32) -> Product {
        Product {
            id: ProductId::new(id),
            code: format!("CODE-{id}"),
            name: format!("Product {id}"),
            description: None,
            price: Decimal::from_str(price).unwrap(),
            discounted_price: discounted.map(|d| Decimal::from_str(d).unwrap()),
            stock,
            images: vec![],
            subcategory_id: SubcategoryId::new(1),
            specifications: BTreeMap::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_build_order_lines_uses_discounted_price() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 2);
        cart.add(ProductId::new(2), 1);

        let products = vec![
            product(1, "1000.00", Some("800.00"), 5),
            product(2, "250.50", None, 1),
        ];

        let lines = build_order_lines(&cart, &products, Currency::Rub).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].unit_price.amount, Decimal::from(800));
        assert_eq!(lines[0].subtotal.amount, Decimal::from(1600));
        assert_eq!(lines[1].subtotal.amount, Decimal::from_str("250.50").unwrap());

        let total = order_total(&lines, Currency::Rub);
        assert_eq!(total.amount, Decimal::from_str("1850.50").unwrap());
    }

    #[test]
    fn test_build_order_lines_rejects_empty_cart() {
        let result = build_order_lines(&Cart::new(), &[], Currency::Rub);
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[test]
    fn test_build_order_lines_missing_product() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(9), 1);
        let result = build_order_lines(&cart, &[product(1, "10", None, 1)], Currency::Rub);
        assert!(matches!(
            result,
            Err(CheckoutError::ProductUnavailable(id)) if id == ProductId::new(9)
        ));
    }

    #[test]
    fn test_build_order_lines_insufficient_stock() {
        let mut cart = Cart::new();
        cart.add(ProductId::new(1), 3);
        let result = build_order_lines(&cart, &[product(1, "10", None, 2)], Currency::Rub);
        assert!(matches!(
            result,
            Err(CheckoutError::InsufficientStock { requested: 3, available: 2, .. })
        ));
    }

    #[test]
    fn test_generate_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 12, 0, 0).unwrap();
        let number = generate_order_number(now);

        assert!(number.starts_with("AMP-20260309-"));
        let suffix = number.trim_start_matches("AMP-20260309-");
        assert_eq!(suffix.len(), ORDER_NUMBER_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| ORDER_NUMBER_ALPHABET.contains(&b)));
    }
}
