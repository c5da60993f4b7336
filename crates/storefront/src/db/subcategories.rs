//! Subcategory repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use ampere_core::{CategoryId, SubcategoryId};

use super::RepositoryError;
use crate::models::{CascadeSummary, Subcategory, SubcategoryInput};

#[derive(sqlx::FromRow)]
pub(super) struct SubcategoryRow {
    id: SubcategoryId,
    category_id: CategoryId,
    name: String,
    description: Option<String>,
    image: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubcategoryRow> for Subcategory {
    fn from(row: SubcategoryRow) -> Self {
        Self {
            id: row.id,
            category_id: row.category_id,
            name: row.name,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for subcategory database operations.
pub struct SubcategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SubcategoryRepository<'a> {
    /// Create a new subcategory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List subcategories, optionally only those of one category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        category: Option<CategoryId>,
    ) -> Result<Vec<Subcategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubcategoryRow>(
            r"
            SELECT id, category_id, name, description, image, created_at, updated_at
            FROM subcategories
            WHERE ($1::INT IS NULL OR category_id = $1)
            ORDER BY name, id
            ",
        )
        .bind(category)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Subcategory::from).collect())
    }

    /// Get a subcategory by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: SubcategoryId) -> Result<Option<Subcategory>, RepositoryError> {
        let row = sqlx::query_as::<_, SubcategoryRow>(
            r"
            SELECT id, category_id, name, description, image, created_at, updated_at
            FROM subcategories
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Subcategory::from))
    }

    /// Create a subcategory.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingParent` if the category doesn't exist.
    pub async fn create(&self, input: &SubcategoryInput) -> Result<Subcategory, RepositoryError> {
        let row = sqlx::query_as::<_, SubcategoryRow>(
            r"
            INSERT INTO subcategories (category_id, name, description, image)
            VALUES ($1, $2, $3, $4)
            RETURNING id, category_id, name, description, image, created_at, updated_at
            ",
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "subcategory already exists", "category"))?;

        Ok(row.into())
    }

    /// Replace a subcategory's fields, possibly moving it to another category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subcategory doesn't exist.
    /// Returns `RepositoryError::MissingParent` if the target category doesn't exist.
    pub async fn update(
        &self,
        id: SubcategoryId,
        input: &SubcategoryInput,
    ) -> Result<Subcategory, RepositoryError> {
        let row = sqlx::query_as::<_, SubcategoryRow>(
            r"
            UPDATE subcategories
            SET category_id = $2, name = $3, description = $4, image = $5, updated_at = now()
            WHERE id = $1
            RETURNING id, category_id, name, description, image, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(&input.image)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "subcategory already exists", "category"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete a subcategory and its products in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the subcategory doesn't exist.
    pub async fn delete_cascade(
        &self,
        id: SubcategoryId,
    ) -> Result<CascadeSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<SubcategoryId> =
            sqlx::query_scalar("SELECT id FROM subcategories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let products = sqlx::query("DELETE FROM products WHERE subcategory_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let subcategories = sqlx::query("DELETE FROM subcategories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        Ok(CascadeSummary {
            categories: 0,
            subcategories,
            products,
        })
    }
}
