//! Orders placed through checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use ampere_core::{Currency, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// Contact and delivery details captured at checkout.
///
/// Stored as a snapshot on the order, so later profile changes don't alter
/// past orders.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 2, max = 100, message = "Name must be 2-100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 5, max = 32, message = "Phone must be 5-32 characters"))]
    pub phone: String,
    #[validate(length(min = 5, max = 500, message = "Address must be 5-500 characters"))]
    pub address: String,
}

/// An order with its line items.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-facing number, `AMP-YYYYMMDD-XXXXXX`.
    pub order_number: String,
    /// `None` for guest checkouts.
    pub user_id: Option<UserId>,
    pub customer: CustomerInfo,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub total: Decimal,
    pub currency: Currency,
    pub comment: Option<String>,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order.
///
/// Code and name are copied from the product at checkout; `product_id`
/// becomes `None` if the product is later deleted.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: Option<ProductId>,
    pub product_code: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Dashboard counters for the back-office.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Sum of totals over orders that were not cancelled.
    pub revenue: Decimal,
    pub orders_today: i64,
}
