//! Order repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use zahra_core::{OrderId, OrderNumber, OrderStatus};

use super::{RepositoryError, map_constraint};
use crate::models::{DashboardStats, NewOrder, Order, OrderItem, OrderSummary, OrderUpdate};

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

    /// Insert an order and every one of its items in a single transaction.
    ///
    /// If any insert fails the transaction is dropped without commit, so no
    /// order row is left without its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the order number already exists.
    /// Returns `RepositoryError::NotFound` if an item references a missing product.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, new: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (
                order_number, customer_name, customer_phone, customer_email,
                delivery_address, city, postal_code, total_amount, payment_method, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(&new.order_number)
        .bind(&new.customer_name)
        .bind(&new.customer_phone)
        .bind(&new.customer_email)
        .bind(&new.delivery_address)
        .bind(&new.city)
        .bind(&new.postal_code)
        .bind(new.total_amount)
        .bind(new.payment_method)
        .bind(&new.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "order number already exists"))?;

        for item in &new.items {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (order_id, product_id, product_name, product_price, quantity, subtotal)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(item.product_price)
            .bind(item.quantity)
            .bind(item.subtotal)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_constraint(e, "duplicate order item"))?;
        }

        tx.commit().await?;
        Ok(order)
    }

    /// Get an order by its customer-facing number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = $1")
            .bind(number)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Get the items of an order in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items =
            sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
                .bind(order_id)
                .fetch_all(self.pool)
                .await?;
        Ok(items)
    }

    /// List orders newest first with their item counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT o.*, COUNT(oi.id) AS item_count \
             FROM orders o LEFT JOIN order_items oi ON oi.order_id = o.id",
        );
        if let Some(status) = status {
            query.push(" WHERE o.order_status = ").push_bind(status);
        }
        query.push(" GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC");

        let orders = query
            .build_query_as::<OrderSummary>()
            .fetch_all(self.pool)
            .await?;
        Ok(orders)
    }

    /// Write the supplied status fields if the order is still in `observed`.
    ///
    /// Returns `Ok(None)` when no row matched, either because the order does
    /// not exist or because another writer changed its status first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        update: OrderUpdate,
        observed: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE orders SET ");
        let mut set = query.separated(", ");
        if let Some(status) = update.order_status {
            set.push("order_status = ").push_bind_unseparated(status);
        }
        if let Some(status) = update.payment_status {
            set.push("payment_status = ").push_bind_unseparated(status);
        }
        set.push("updated_at = NOW()");
        query.push(" WHERE id = ").push_bind(id);
        query.push(" AND order_status = ").push_bind(observed);
        query.push(" RETURNING *");

        let order = query
            .build_query_as::<Order>()
            .fetch_optional(self.pool)
            .await?;
        Ok(order)
    }

    /// Compute the staff dashboard counters.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        let stats = sqlx::query_as::<_, DashboardStats>(
            r"
            SELECT
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COUNT(*) FROM orders WHERE order_status = 'pending') AS pending_orders,
                (SELECT COALESCE(SUM(total_amount), 0) FROM orders) AS total_revenue,
                (SELECT COUNT(*) FROM products) AS product_count
            ",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(stats)
    }
}
