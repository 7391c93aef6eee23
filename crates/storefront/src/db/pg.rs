//! `PostgreSQL`-backed [`Store`].

use sqlx::PgPool;

use zahra_core::{
    CartItemId, Email, OrderId, OrderNumber, OrderStatus, PaymentProofId, ProductId,
};

use super::carts::CartRepository;
use super::catalog::CatalogRepository;
use super::orders::OrderRepository;
use super::payment_proofs::PaymentProofRepository;
use super::users::UserRepository;
use super::{RepositoryError, Store};
use crate::models::{
    CartLine, Category, DashboardStats, NewOrder, NewProduct, Order, OrderItem, OrderSummary,
    OrderUpdate, PaymentProof, Product, ProductChanges, ProductFilter, ProofVerification, User,
};

/// Production store delegating to the per-table repositories.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CatalogRepository::new(&self.pool).list_categories().await
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool).list_products(filter).await
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool).get_product(id).await
    }

    async fn create_product(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .create_product(product)
            .await
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(&self.pool)
            .update_product(id, changes)
            .await
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        CatalogRepository::new(&self.pool).delete_product(id).await
    }

    async fn cart_lines(&self, owner_key: &str) -> Result<Vec<CartLine>, RepositoryError> {
        CartRepository::new(&self.pool).lines(owner_key).await
    }

    async fn add_cart_item(
        &self,
        owner_key: &str,
        product_id: ProductId,
        quantity: i32,
        max_quantity: i32,
    ) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool)
            .add(owner_key, product_id, quantity, max_quantity)
            .await
    }

    async fn set_cart_quantity(
        &self,
        owner_key: &str,
        id: CartItemId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        CartRepository::new(&self.pool)
            .set_quantity(owner_key, id, quantity)
            .await
    }

    async fn remove_cart_item(
        &self,
        owner_key: &str,
        id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        CartRepository::new(&self.pool).remove(owner_key, id).await
    }

    async fn insert_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).insert(order).await
    }

    async fn find_order_by_number(
        &self,
        number: &OrderNumber,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_number(number).await
    }

    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool).get_by_id(id).await
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        OrderRepository::new(&self.pool).items(order_id).await
    }

    async fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        OrderRepository::new(&self.pool).list(status).await
    }

    async fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
        observed: OrderStatus,
    ) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .update_status(id, update, observed)
            .await
    }

    async fn latest_payment_proof(
        &self,
        order_id: OrderId,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        PaymentProofRepository::new(&self.pool)
            .latest_for_order(order_id)
            .await
    }

    async fn attach_payment_proof(
        &self,
        order_id: OrderId,
        image_url: &str,
    ) -> Result<PaymentProof, RepositoryError> {
        PaymentProofRepository::new(&self.pool)
            .attach(order_id, image_url)
            .await
    }

    async fn get_payment_proof(
        &self,
        id: PaymentProofId,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        PaymentProofRepository::new(&self.pool).get(id).await
    }

    async fn record_proof_decision(
        &self,
        id: PaymentProofId,
        verification: &ProofVerification,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        PaymentProofRepository::new(&self.pool)
            .record_decision(id, verification)
            .await
    }

    async fn create_user(&self, email: &Email, password_hash: &str) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool)
            .create_with_password(email, password_hash)
            .await
    }

    async fn find_user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool)
            .get_password_hash(email)
            .await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        OrderRepository::new(&self.pool).dashboard_stats().await
    }
}
