//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and serialize with the column names the
//! JSON API exposes. Input types (`New*`, `*Changes`) are validated by the
//! services before they reach a [`Store`](crate::db::Store).

pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;
pub mod session;
pub mod user;

pub use cart::{CartLine, CartView};
pub use catalog::{Category, NewProduct, Product, ProductChanges, ProductFilter};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderDetail, OrderItem, OrderSummary, OrderUpdate,
};
pub use payment::{PaymentProof, ProofVerification};
pub use session::CurrentUser;
pub use user::{DashboardStats, User};
