//! Product repository.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;

use ampere_core::{CategoryId, ProductId, SubcategoryId};

use super::{Page, Pagination, RepositoryError};
use crate::models::{Product, ProductInput};

const CODE_CONFLICT: &str = "product code already exists";
const MISSING_SUBCATEGORY: &str = "subcategory";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    code: String,
    name: String,
    description: Option<String>,
    price: Decimal,
    discounted_price: Option<Decimal>,
    stock: i32,
    images: Vec<String>,
    subcategory_id: SubcategoryId,
    specifications: Json<BTreeMap<String, String>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            code: row.code,
            name: row.name,
            description: row.description,
            price: row.price,
            discounted_price: row.discounted_price,
            stock: row.stock,
            images: row.images,
            subcategory_id: row.subcategory_id,
            specifications: row.specifications.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Filters for product listings. All conditions are combined with AND.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub subcategory: Option<SubcategoryId>,
    pub category: Option<CategoryId>,
    /// Case-insensitive substring match on name or code.
    pub search: Option<String>,
    pub in_stock: bool,
    pub pagination: Pagination,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Page<Product>, RepositoryError> {
        let search = filter.search.as_deref().and_then(like_pattern);

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT p.id, p.code, p.name, p.description, p.price, p.discounted_price,
                   p.stock, p.images, p.subcategory_id, p.specifications,
                   p.created_at, p.updated_at
            FROM products p
            JOIN subcategories s ON s.id = p.subcategory_id
            WHERE ($1::INT IS NULL OR p.subcategory_id = $1)
              AND ($2::INT IS NULL OR s.category_id = $2)
              AND ($3::TEXT IS NULL OR p.name ILIKE $3 OR p.code ILIKE $3)
              AND (NOT $4 OR p.stock > 0)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $5 OFFSET $6
            ",
        )
        .bind(filter.subcategory)
        .bind(filter.category)
        .bind(search.as_deref())
        .bind(filter.in_stock)
        .bind(filter.pagination.limit())
        .bind(filter.pagination.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM products p
            JOIN subcategories s ON s.id = p.subcategory_id
            WHERE ($1::INT IS NULL OR p.subcategory_id = $1)
              AND ($2::INT IS NULL OR s.category_id = $2)
              AND ($3::TEXT IS NULL OR p.name ILIKE $3 OR p.code ILIKE $3)
              AND (NOT $4 OR p.stock > 0)
            ",
        )
        .bind(filter.subcategory)
        .bind(filter.category)
        .bind(search.as_deref())
        .bind(filter.in_stock)
        .fetch_one(self.pool)
        .await?;

        let products = rows.into_iter().map(Product::from).collect();
        Ok(filter.pagination.page_of(products, total))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, code, name, description, price, discounted_price, stock, images,
                   subcategory_id, specifications, created_at, updated_at
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Get a product by its unique code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, code, name, description, price, discounted_price, stock, images,
                   subcategory_id, specifications, created_at, updated_at
            FROM products
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Fetch several products at once. Unknown IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, code, name, description, price, discounted_price, stock, images,
                   subcategory_id, specifications, created_at, updated_at
            FROM products
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already taken.
    /// Returns `RepositoryError::MissingParent` if the subcategory doesn't exist.
    pub async fn create(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (code, name, description, price, discounted_price, stock,
                                  images, subcategory_id, specifications)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, code, name, description, price, discounted_price, stock, images,
                      subcategory_id, specifications, created_at, updated_at
            ",
        )
        .bind(input.code.trim())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discounted_price)
        .bind(input.stock)
        .bind(&input.images)
        .bind(input.subcategory_id)
        .bind(Json(&input.specifications))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, CODE_CONFLICT, MISSING_SUBCATEGORY))?;

        Ok(row.into())
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new code belongs to another product.
    /// Returns `RepositoryError::MissingParent` if the subcategory doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            UPDATE products
            SET code = $2, name = $3, description = $4, price = $5, discounted_price = $6,
                stock = $7, images = $8, subcategory_id = $9, specifications = $10,
                updated_at = now()
            WHERE id = $1
            RETURNING id, code, name, description, price, discounted_price, stock, images,
                      subcategory_id, specifications, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(input.code.trim())
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.discounted_price)
        .bind(input.stock)
        .bind(&input.images)
        .bind(input.subcategory_id)
        .bind(Json(&input.specifications))
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, CODE_CONFLICT, MISSING_SUBCATEGORY))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a product.
    ///
    /// Order lines keep their snapshot and lose the product reference.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

/// Build an `ILIKE` substring pattern, escaping wildcards in user input.
fn like_pattern(search: &str) -> Option<String> {
    let search = search.trim();
    if search.is_empty() {
        return None;
    }

    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Some(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("  iphone "), Some("%iphone%".to_string()));
        assert_eq!(like_pattern("100%_"), Some("%100\\%\\_%".to_string()));
        assert_eq!(like_pattern("   "), None);
    }
}
