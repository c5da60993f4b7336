//! Favorite products per user.

use sqlx::PgPool;

use ampere_core::{FavoritesState, ProductId, UserId};

use super::RepositoryError;

/// Repository for favorites.
pub struct FavoriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavoriteRepository<'a> {
    /// Create a new favorites repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's favorites in the order they were added.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<FavoritesState, RepositoryError> {
        let ids: Vec<ProductId> = sqlx::query_scalar(
            r"
            SELECT product_id
            FROM favorites
            WHERE user_id = $1
            ORDER BY created_at, product_id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids.into_iter().collect())
    }

    /// Add a favorite. Adding an existing favorite is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MissingParent` if the product doesn't exist.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO favorites (user_id, product_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "already a favorite", "product"))?;

        Ok(())
    }

    /// Remove a favorite. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND product_id = $2")
            .bind(user_id)
            .bind(product_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace a user's favorites with `state`.
    ///
    /// Product IDs that no longer exist are dropped rather than rejected, so
    /// a client's stale local list can always be pushed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn replace(
        &self,
        user_id: UserId,
        state: &FavoritesState,
    ) -> Result<FavoritesState, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM favorites WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        // ordinality keeps the client's order in created_at
        sqlx::query(
            r"
            INSERT INTO favorites (user_id, product_id, created_at)
            SELECT $1, ids.product_id, now() + ids.position * interval '1 microsecond'
            FROM unnest($2::INT[]) WITH ORDINALITY AS ids(product_id, position)
            JOIN products p ON p.id = ids.product_id
            ",
        )
        .bind(user_id)
        .bind(state.product_ids())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.list(user_id).await
    }
}
