//! Cart line repository.
//!
//! Every statement carries the owner key in its predicate.

use sqlx::PgPool;

use zahra_core::{CartItemId, ProductId};

use super::{RepositoryError, map_constraint};
use crate::models::CartLine;

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the owner's lines, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, owner_key: &str) -> Result<Vec<CartLine>, RepositoryError> {
        let lines = sqlx::query_as::<_, CartLine>(
            r"
            SELECT ci.id, ci.quantity, p.id AS product_id, p.name, p.price,
                   p.image_url, p.stock_quantity
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.owner_key = $1
            ORDER BY ci.created_at DESC, ci.id DESC
            ",
        )
        .bind(owner_key)
        .fetch_all(self.pool)
        .await?;
        Ok(lines)
    }

    /// Add to the owner's line for a product, creating it if needed.
    ///
    /// A single upsert so concurrent adds for the same product both count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(
        &self,
        owner_key: &str,
        product_id: ProductId,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cart_items (owner_key, product_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_key, product_id)
            DO UPDATE SET quantity = LEAST(cart_items.quantity + EXCLUDED.quantity, $4),
                          updated_at = NOW()
            ",
        )
        .bind(owner_key)
        .bind(product_id)
        .bind(quantity)
        .bind(max_quantity)
        .execute(self.pool)
        .await
        .map_err(|e| map_constraint(e, "cart line already exists"))?;
        Ok(())
    }

    /// Set the quantity of one of the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_quantity(
        &self,
        owner_key: &str,
        id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $1, updated_at = NOW() \
             WHERE id = $2 AND owner_key = $3",
        )
        .bind(quantity)
        .bind(id)
        .bind(owner_key)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove one of the owner's lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, owner_key: &str, id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND owner_key = $2")
            .bind(id)
            .bind(owner_key)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
