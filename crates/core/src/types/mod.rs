//! Core types for the storefront domain.

pub mod email;
pub mod id;
pub mod order_number;
pub mod owner;
pub mod pricing;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use order_number::{OrderNumber, OrderNumberError};
pub use owner::{CartOwner, GuestToken};
pub use pricing::{ShippingPolicy, line_subtotal};
pub use status::*;
