//! Order repository.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use ampere_core::{
    Cart, Currency, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId,
};

use super::products::ProductRow;
use super::{Page, Pagination, RepositoryError};
use crate::models::{CustomerInfo, Order, OrderItem, OrderStats, Product};
use crate::services::checkout::{
    CheckoutError, OrderLine, build_order_lines, generate_order_number, order_total,
};

const ORDER_COLUMNS: &str = "id, order_number, user_id, customer_name, customer_email, \
     customer_phone, customer_address, payment_method, status, total, currency, comment, \
     created_at, updated_at";

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: String,
    user_id: Option<UserId>,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: String,
    payment_method: PaymentMethod,
    status: OrderStatus,
    total: Decimal,
    currency: String,
    comment: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    order_id: OrderId,
    product_id: Option<ProductId>,
    product_code: String,
    product_name: String,
    quantity: i32,
    unit_price: Decimal,
    subtotal: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_code: row.product_code,
            product_name: row.product_name,
            quantity: row.quantity,
            unit_price: row.unit_price,
            subtotal: row.subtotal,
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let currency = Currency::from_str(&self.currency).map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.order_number))
        })?;

        Ok(Order {
            id: self.id,
            order_number: self.order_number,
            user_id: self.user_id,
            customer: CustomerInfo {
                name: self.customer_name,
                email: self.customer_email,
                phone: self.customer_phone,
                address: self.customer_address,
            },
            payment_method: self.payment_method,
            status: self.status,
            total: self.total,
            currency,
            comment: self.comment,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderStatsRow {
    total_orders: i64,
    pending_orders: i64,
    revenue: Decimal,
    orders_today: i64,
}

/// Everything needed to place an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// `None` for guest checkout.
    pub user_id: Option<UserId>,
    pub customer: CustomerInfo,
    pub payment_method: PaymentMethod,
    pub comment: Option<String>,
    pub currency: Currency,
    pub cart: Cart,
}

/// Filters for the back-office order listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub pagination: Pagination,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from a cart.
    ///
    /// Locks the ordered products, checks and decrements stock, then writes
    /// the order and its lines. Nothing is written if any step fails.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart`, `CheckoutError::ProductUnavailable`
    /// or `CheckoutError::InsufficientStock` when the cart can't be fulfilled,
    /// and `CheckoutError::Repository` on database failures.
    pub async fn create_from_checkout(&self, new: &NewOrder) -> Result<Order, CheckoutError> {
        if new.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let mut tx = self.pool.begin().await?;

        let products: Vec<Product> = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, code, name, description, price, discounted_price, stock, images,
                   subcategory_id, specifications, created_at, updated_at
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(new.cart.product_ids())
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

        let lines = build_order_lines(&new.cart, &products, new.currency)?;
        let total = order_total(&lines, new.currency);

        for line in &lines {
            sqlx::query("UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1")
                .bind(line.product_id)
                .bind(line_quantity(line))
                .execute(&mut *tx)
                .await?;
        }

        let order_row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (order_number, user_id, customer_name, customer_email,
                                customer_phone, customer_address, payment_method, total,
                                currency, comment)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(generate_order_number(Utc::now()))
        .bind(new.user_id)
        .bind(new.customer.name.trim())
        .bind(new.customer.email.trim())
        .bind(new.customer.phone.trim())
        .bind(new.customer.address.trim())
        .bind(new.payment_method)
        .bind(total.amount)
        .bind(new.currency.code())
        .bind(new.comment.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "order number already exists", "user"))?;

        let mut items = Vec::with_capacity(lines.len());
        for line in &lines {
            let row = sqlx::query_as::<_, OrderItemRow>(
                r"
                INSERT INTO order_items (order_id, product_id, product_code, product_name,
                                         quantity, unit_price, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, order_id, product_id, product_code, product_name,
                          quantity, unit_price, subtotal
                ",
            )
            .bind(order_row.id)
            .bind(line.product_id)
            .bind(&line.product_code)
            .bind(&line.product_name)
            .bind(line_quantity(line))
            .bind(line.unit_price.amount)
            .bind(line.subtotal.amount)
            .fetch_one(&mut *tx)
            .await?;
            items.push(OrderItem::from(row));
        }

        tx.commit().await?;

        Ok(order_row.into_order(items)?)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        self.with_items(row.into_iter().collect())
            .await
            .map(|mut orders| orders.pop())
    }

    /// Get an order by its public order number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_by_number(&self, number: &str) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1"
        ))
        .bind(number)
        .fetch_optional(self.pool)
        .await?;

        self.with_items(row.into_iter().collect())
            .await
            .map(|mut orders| orders.pop())
    }

    /// All orders placed by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        self.with_items(rows).await
    }

    /// Back-office listing, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &OrderFilter) -> Result<Page<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE ($1::order_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(filter.status)
        .bind(filter.pagination.limit())
        .bind(filter.pagination.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
        )
        .bind(filter.status)
        .fetch_one(self.pool)
        .await?;

        let orders = self.with_items(rows).await?;
        Ok(filter.pagination.page_of(orders, total))
    }

    /// Move an order from `from` to `to`.
    ///
    /// The update only applies while the order is still in `from`, so two
    /// admins racing on the same order can't both succeed. Cancelling returns
    /// the ordered quantities to stock in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if its status is no longer `from`.
    pub async fn update_status(
        &self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            let exists: Option<OrderId> = sqlx::query_scalar("SELECT id FROM orders WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
            return Err(if exists.is_some() {
                RepositoryError::Conflict(format!("order is no longer {from}"))
            } else {
                RepositoryError::NotFound
            });
        };

        if to == OrderStatus::Cancelled {
            sqlx::query(
                r"
                UPDATE products p
                SET stock = p.stock + oi.quantity, updated_at = now()
                FROM order_items oi
                WHERE oi.order_id = $1 AND oi.product_id = p.id
                ",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut orders = self.with_items(vec![row]).await?;
        orders.pop().ok_or(RepositoryError::NotFound)
    }

    /// Dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let row = sqlx::query_as::<_, OrderStatsRow>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders,
                COALESCE(SUM(total) FILTER (WHERE status <> 'cancelled'), 0) AS revenue,
                COUNT(*) FILTER (WHERE created_at >= date_trunc('day', now())) AS orders_today
            FROM orders
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(OrderStats {
            total_orders: row.total_orders,
            pending_orders: row.pending_orders,
            revenue: row.revenue,
            orders_today: row.orders_today,
        })
    }

    /// Load line items for `rows` and assemble orders, keeping row order.
    async fn with_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<OrderId> = rows.iter().map(|row| row.id).collect();
        let item_rows = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, order_id, product_id, product_code, product_name,
                   quantity, unit_price, subtotal
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY id
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut grouped = group_items(item_rows);
        rows.into_iter()
            .map(|row| {
                let items = grouped.remove(&row.id).unwrap_or_default();
                row.into_order(items)
            })
            .collect()
    }
}

fn group_items(rows: Vec<OrderItemRow>) -> HashMap<OrderId, Vec<OrderItem>> {
    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.into());
    }
    grouped
}

/// Cart lines are capped well below `i32::MAX`.
fn line_quantity(line: &OrderLine) -> i32 {
    i32::try_from(line.quantity).unwrap_or(i32::MAX)
}
