//! Categories and products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use zahra_core::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL-safe, unique.
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

/// A product joined with its category's name and slug.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Filters accepted by the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only products in the category with this slug.
    pub category: Option<String>,
    /// Only featured products.
    pub featured: bool,
    /// Maximum number of products to return.
    pub limit: Option<i64>,
}

/// A validated product ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub category_id: CategoryId,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub is_featured: bool,
}

/// A partial product update. `None` fields are left untouched.
///
/// `is_featured` is always written because the admin form always submits it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<CategoryId>,
    pub image_url: Option<String>,
    pub stock_quantity: Option<i32>,
    pub is_featured: bool,
}
