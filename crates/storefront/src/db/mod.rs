//! Persistence for the storefront.
//!
//! # Database
//!
//! ## Tables
//!
//! - `users` - Customer accounts (argon2 password hashes)
//! - `tower_sessions.session` - Session storage (created by the session store)
//! - `categories`, `products` - Catalog
//! - `cart_items` - One row per (owner, product), keyed by [`CartOwner::key`]
//! - `orders`, `order_items` - Orders and their snapshotted lines
//! - `payment_proofs` - Uploaded proofs awaiting staff review
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p zahra-cli -- migrate
//! ```
//!
//! # Storage seam
//!
//! Handlers and services talk to a [`Store`]. [`PgStore`] is the production
//! implementation built from the per-table repositories in this module;
//! [`MemoryStore`] keeps everything in process for tests.
//!
//! [`CartOwner::key`]: zahra_core::CartOwner::key

pub mod carts;
pub mod catalog;
pub mod memory;
pub mod orders;
pub mod payment_proofs;
pub mod pg;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use zahra_core::{
    CartItemId, Email, OrderId, OrderNumber, OrderStatus, PaymentProofId, ProductId,
};

use crate::models::{
    CartLine, Category, DashboardStats, NewOrder, NewProduct, Order, OrderItem, OrderSummary,
    OrderUpdate, PaymentProof, Product, ProductChanges, ProductFilter, ProofVerification, User,
};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested or referenced entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email, already decided proof).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map unique and foreign-key violations onto repository errors.
fn map_constraint(e: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(e)
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Every persistence operation the storefront performs.
///
/// Cart operations are always scoped by an owner key so one shopper can never
/// touch another shopper's lines. Multi-row writes (`insert_order`,
/// `attach_payment_proof`, `record_proof_decision`) are all-or-nothing.
pub trait Store: Clone + Send + Sync + 'static {
    /// Check that the backing store is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All categories ordered by name.
    fn list_categories(&self) -> impl Future<Output = Result<Vec<Category>, RepositoryError>> + Send;

    /// Products matching `filter`, newest first.
    fn list_products(
        &self,
        filter: &ProductFilter,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    /// A single product with its category joined in.
    fn get_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Insert a product. `NotFound` if the category does not exist.
    fn create_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    /// Apply a partial update. `Ok(None)` if the product does not exist.
    fn update_product(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Hard-delete a product. Returns whether a row was removed.
    fn delete_product(
        &self,
        id: ProductId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    // =========================================================================
    // Cart
    // =========================================================================

    /// The owner's lines joined with live product data, newest first.
    fn cart_lines(
        &self,
        owner_key: &str,
    ) -> impl Future<Output = Result<Vec<CartLine>, RepositoryError>> + Send;

    /// Add `quantity` of a product, incrementing an existing line atomically
    /// up to `max_quantity`. `NotFound` if the product does not exist.
    fn add_cart_item(
        &self,
        owner_key: &str,
        product_id: ProductId,
        quantity: i32,
        max_quantity: i32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Set a line's quantity (must be positive). Returns whether a line owned
    /// by `owner_key` was updated.
    fn set_cart_quantity(
        &self,
        owner_key: &str,
        id: CartItemId,
        quantity: i32,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Remove a line. Returns whether a line owned by `owner_key` was removed.
    fn remove_cart_item(
        &self,
        owner_key: &str,
        id: CartItemId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Write an order and all its items in one transaction.
    /// `Conflict` if the order number is already taken.
    fn insert_order(
        &self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    fn find_order_by_number(
        &self,
        number: &OrderNumber,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    fn get_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    fn order_items(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Vec<OrderItem>, RepositoryError>> + Send;

    /// Orders newest first with their line counts, optionally by status.
    fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<Vec<OrderSummary>, RepositoryError>> + Send;

    /// Write the supplied status fields and refresh `updated_at`, provided
    /// the order still has `observed` as its status. `Ok(None)` if the order
    /// does not exist or its status has moved on.
    fn update_order(
        &self,
        id: OrderId,
        update: OrderUpdate,
        observed: OrderStatus,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    // =========================================================================
    // Payment proofs
    // =========================================================================

    /// The most recently uploaded proof for an order.
    fn latest_payment_proof(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Option<PaymentProof>, RepositoryError>> + Send;

    /// Insert a pending proof and mark the order `proof_uploaded`, atomically.
    fn attach_payment_proof(
        &self,
        order_id: OrderId,
        image_url: &str,
    ) -> impl Future<Output = Result<PaymentProof, RepositoryError>> + Send;

    fn get_payment_proof(
        &self,
        id: PaymentProofId,
    ) -> impl Future<Output = Result<Option<PaymentProof>, RepositoryError>> + Send;

    /// Record a decision on a pending proof; approval also confirms the
    /// order's payment. `Ok(None)` if the proof does not exist, `Conflict` if
    /// it was already decided.
    fn record_proof_decision(
        &self,
        id: PaymentProofId,
        verification: &ProofVerification,
    ) -> impl Future<Output = Result<Option<PaymentProof>, RepositoryError>> + Send;

    // =========================================================================
    // Users
    // =========================================================================

    /// `Conflict` if the email is already registered.
    fn create_user(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// A user and their password hash.
    fn find_user_with_password(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    // =========================================================================
    // Staff dashboard
    // =========================================================================

    fn dashboard_stats(&self)
    -> impl Future<Output = Result<DashboardStats, RepositoryError>> + Send;
}
