//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                - Liveness
//! GET    /health/ready          - Readiness (database reachable)
//! GET    /uploads/{file}        - Stored uploads
//!
//! # Catalog
//! GET    /categories            - Category list
//! GET    /products              - Product list (?category=&featured=&limit=)
//! GET    /products/{id}         - Product detail
//!
//! # Cart (owner resolved per request, guest cookie on every guest response)
//! GET    /cart                  - Cart lines, total and count
//! POST   /cart                  - Add or increment a product
//! PUT    /cart                  - Set a line's quantity (<= 0 removes)
//! DELETE /cart?id=              - Remove a line
//!
//! # Orders
//! POST   /orders                - Checkout
//! GET    /orders?orderNumber=   - Order detail with items and latest proof
//! POST   /payment-proof         - Upload a payment proof (multipart)
//!
//! # Auth
//! POST   /auth/register         - Create an account and sign in
//! POST   /auth/login            - Sign in
//! POST   /auth/logout           - Sign out
//! GET    /auth/me               - Current user
//!
//! # Admin
//! GET    /admin/stats           - Dashboard counters
//! GET    /admin/orders          - Order list (?status=)
//! PUT    /admin/orders          - Update order and payment status
//! POST   /admin/products        - Create product (multipart)
//! PUT    /admin/products        - Update product (multipart)
//! DELETE /admin/products?id=    - Delete product
//! PUT    /admin/payment-proofs  - Approve or reject a proof
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod multipart;
pub mod orders;
pub mod payments;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::db::Store;
use crate::middleware::{api_rate_limiter, strict_rate_limiter};
use crate::state::AppState;

/// Catalog, cart and admin routes.
pub fn general_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/categories", get(catalog::categories::<S>))
        .route("/products", get(catalog::products::<S>))
        .route("/products/{id}", get(catalog::product::<S>))
        .route(
            "/cart",
            get(cart::show::<S>)
                .post(cart::add::<S>)
                .put(cart::update::<S>)
                .delete(cart::remove::<S>),
        )
        .nest("/admin", admin_routes())
}

/// Routes that create accounts, sessions, orders or files, plus order
/// lookup, which would otherwise invite guessing order numbers.
pub fn sensitive_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/orders", get(orders::show::<S>).post(orders::create::<S>))
        .route("/payment-proof", post(payments::submit::<S>))
        .nest("/auth", auth_routes())
}

/// Create the auth routes router.
pub fn auth_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/register", post(auth::register::<S>))
        .route("/login", post(auth::login::<S>))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the admin routes router.
pub fn admin_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/stats", get(admin::stats::<S>))
        .route(
            "/orders",
            get(admin::list_orders::<S>).put(admin::update_order::<S>),
        )
        .route(
            "/products",
            post(admin::create_product::<S>)
                .put(admin::update_product::<S>)
                .delete(admin::delete_product::<S>),
        )
        .route("/payment-proofs", put(admin::review_payment_proof::<S>))
}

/// Create all routes for the storefront, without rate limits.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    general_routes().merge(sensitive_routes())
}

/// All routes with per-IP rate limits: strict on sensitive routes, relaxed
/// elsewhere.
pub fn rate_limited_routes<S: Store>() -> Router<AppState<S>> {
    general_routes()
        .layer(api_rate_limiter())
        .merge(sensitive_routes().layer(strict_rate_limiter()))
}
