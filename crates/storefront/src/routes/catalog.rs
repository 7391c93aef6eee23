//! Catalog route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use zahra_core::ProductId;

use crate::db::Store;
use crate::error::Result;
use crate::models::ProductFilter;
use crate::services::catalog::CatalogService;
use crate::state::AppState;

/// Query string of `GET /products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    /// Category slug.
    pub category: Option<String>,
    /// `true` restricts to featured products; any other value is ignored.
    pub featured: Option<String>,
    pub limit: Option<i64>,
}

impl From<ProductQuery> for ProductFilter {
    fn from(query: ProductQuery) -> Self {
        Self {
            category: query.category.filter(|slug| !slug.trim().is_empty()),
            featured: query.featured.as_deref() == Some("true"),
            limit: query.limit,
        }
    }
}

/// `GET /categories`
#[instrument(skip(state))]
pub async fn categories<S: Store>(State(state): State<AppState<S>>) -> Result<Json<Value>> {
    let categories = CatalogService::new(state.store(), state.uploads())
        .categories()
        .await?;
    Ok(Json(json!({ "categories": categories })))
}

/// `GET /products?category=&featured=&limit=`
#[instrument(skip(state))]
pub async fn products<S: Store>(
    State(state): State<AppState<S>>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let products = CatalogService::new(state.store(), state.uploads())
        .products(&query.into())
        .await?;
    Ok(Json(json!({ "products": products })))
}

/// `GET /products/{id}`
#[instrument(skip(state))]
pub async fn product<S: Store>(
    State(state): State<AppState<S>>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Value>> {
    let Path(id) = id?;
    let product = CatalogService::new(state.store(), state.uploads())
        .product(id)
        .await?;
    Ok(Json(json!({ "product": product })))
}
