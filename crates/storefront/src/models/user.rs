//! Customer accounts and staff dashboard counters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use zahra_core::{Email, UserId};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Headline numbers for the staff dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    /// Sum of `total_amount` over every order.
    pub total_revenue: Decimal,
    pub product_count: i64,
}
