//! Business logic for the storefront.
//!
//! Services borrow a [`Store`](crate::db::Store) (and, where files are
//! involved, the [`UploadStorage`](uploads::UploadStorage)) for the length of
//! one request. Each has its own error enum; the HTTP layer maps them onto
//! status codes in [`crate::error`].
//!
//! # Services
//!
//! - `auth` - Password accounts (argon2)
//! - `cart` - Per-owner cart lines
//! - `catalog` - Category and product listing, staff product management
//! - `orders` - Checkout, order tracking, staff status updates
//! - `payments` - Payment-proof intake and staff verification
//! - `uploads` - Image storage on local disk

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payments;
pub mod uploads;
