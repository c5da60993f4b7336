//! Category repository.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use ampere_core::CategoryId;

use super::RepositoryError;
use super::subcategories::SubcategoryRow;
use crate::models::{CascadeSummary, Category, CategoryInput, CategoryWithSubcategories, Subcategory};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    description: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Row counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, Serialize, sqlx::FromRow)]
pub struct CatalogCounts {
    pub categories: i64,
    pub subcategories: i64,
    pub products: i64,
    pub out_of_stock: i64,
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories with their subcategories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_with_subcategories(
        &self,
    ) -> Result<Vec<CategoryWithSubcategories>, RepositoryError> {
        let categories = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, created_at, updated_at
            FROM categories
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        let subcategories = sqlx::query_as::<_, SubcategoryRow>(
            r"
            SELECT id, category_id, name, description, image, created_at, updated_at
            FROM subcategories
            ORDER BY name, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(group_subcategories(
            categories.into_iter().map(Category::from).collect(),
            subcategories.into_iter().map(Subcategory::from).collect(),
        ))
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            SELECT id, name, description, image, created_at, updated_at
            FROM categories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Category::from))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            INSERT INTO categories (name, description, image)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, image, created_at, updated_at
            ",
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn update(
        &self,
        id: CategoryId,
        input: &CategoryInput,
    ) -> Result<Category, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r"
            UPDATE categories
            SET name = $2, description = $3, image = $4, updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, image, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a category with all of its subcategories and their products.
    ///
    /// Runs in one transaction: either everything goes or nothing does.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist.
    pub async fn delete_cascade(&self, id: CategoryId) -> Result<CascadeSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<CategoryId> =
            sqlx::query_scalar("SELECT id FROM categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let products = sqlx::query(
            r"
            DELETE FROM products
            WHERE subcategory_id IN (SELECT id FROM subcategories WHERE category_id = $1)
            ",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let subcategories = sqlx::query("DELETE FROM subcategories WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let categories = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(CascadeSummary {
            categories,
            subcategories,
            products,
        })
    }

    /// Catalog-wide row counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<CatalogCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, CatalogCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM categories) AS categories,
                (SELECT COUNT(*) FROM subcategories) AS subcategories,
                (SELECT COUNT(*) FROM products) AS products,
                (SELECT COUNT(*) FROM products WHERE stock = 0) AS out_of_stock
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }
}

/// Attach each subcategory to its category, keeping both input orders.
fn group_subcategories(
    categories: Vec<Category>,
    subcategories: Vec<Subcategory>,
) -> Vec<CategoryWithSubcategories> {
    let mut tree: Vec<CategoryWithSubcategories> = categories
        .into_iter()
        .map(|category| CategoryWithSubcategories {
            category,
            subcategories: Vec::new(),
        })
        .collect();

    for subcategory in subcategories {
        if let Some(node) = tree
            .iter_mut()
            .find(|node| node.category.id == subcategory.category_id)
        {
            node.subcategories.push(subcategory);
        }
    }

    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(id: i32, name: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: name.to_string(),
            description: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn subcategory(id: i32, category_id: i32, name: &str) -> Subcategory {
        Subcategory {
            id: ampere_core::SubcategoryId::new(id),
            category_id: CategoryId::new(category_id),
            name: name.to_string(),
            description: None,
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_group_subcategories() {
        let tree = group_subcategories(
            vec![category(1, "Laptops"), category(2, "Phones")],
            vec![
                subcategory(10, 2, "Android"),
                subcategory(11, 1, "Gaming"),
                subcategory(12, 2, "iOS"),
                subcategory(13, 99, "Orphan"),
            ],
        );

        assert_eq!(tree.len(), 2);
        let laptops: Vec<_> = tree[0].subcategories.iter().map(|s| s.name.as_str()).collect();
        let phones: Vec<_> = tree[1].subcategories.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(laptops, ["Gaming"]);
        assert_eq!(phones, ["Android", "iOS"]);
    }
}
