//! Orders and their line items.
//!
//! Line items snapshot the product name and price at checkout so historical
//! orders stay accurate after the catalog changes or a product is deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use zahra_core::{
    OrderId, OrderItemId, OrderNumber, OrderStatus, PaymentMethod, PaymentStatus, ProductId,
};

use super::payment::PaymentProof;

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub order_status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// An order row in the staff listing, with its line count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub item_count: i64,
}

/// Everything the order-tracking page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Most recent proof, if any was uploaded.
    pub payment_proof: Option<PaymentProof>,
}

/// A validated order ready to be written, items included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: Option<String>,
    pub delivery_address: String,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub items: Vec<NewOrderItem>,
}

/// One line of a [`NewOrder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Staff update of an order's status fields. At least one must be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderUpdate {
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

impl OrderUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.order_status.is_none() && self.payment_status.is_none()
    }
}
