//! Zahra Core - Shared domain types.
//!
//! This crate provides the types used across the Zahra Fashion components:
//! - `storefront` - Public storefront and staff endpoints (JSON over HTTP)
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Anything that needs the clock or randomness takes it as an
//! argument so it can be tested deterministically.
//!
//! # Modules
//!
//! - [`types`] - Typed ids, emails, statuses, cart identity, pricing and order numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
