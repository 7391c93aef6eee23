//! Cart route handlers.
//!
//! Every response for a guest carries the `guest_session` cookie so the
//! cart survives across visits.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use zahra_core::{CartItemId, ProductId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::ShopperIdentity;
use crate::services::cart::CartService;
use crate::state::AppState;

/// `POST /cart` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: Option<ProductId>,
    pub quantity: Option<i32>,
}

/// `PUT /cart` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartRequest {
    pub cart_item_id: Option<CartItemId>,
    pub quantity: Option<i32>,
}

/// `DELETE /cart` query string.
#[derive(Debug, Deserialize)]
pub struct RemoveQuery {
    pub id: Option<CartItemId>,
}

/// `GET /cart`
#[instrument(skip(state, identity), fields(cart_owner))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    identity: ShopperIdentity,
) -> Result<impl IntoResponse> {
    let view = CartService::new(state.store()).view(&identity.owner).await?;
    Ok((AppendHeaders(identity.guest_cookie()), Json(view)))
}

/// `POST /cart`
#[instrument(skip(state, identity, body), fields(cart_owner))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    identity: ShopperIdentity,
    body: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = body?;
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;

    CartService::new(state.store())
        .add(&identity.owner, product_id, body.quantity.unwrap_or(1))
        .await?;
    Ok((
        AppendHeaders(identity.guest_cookie()),
        Json(json!({ "success": true })),
    ))
}

/// `PUT /cart`
#[instrument(skip(state, identity, body), fields(cart_owner))]
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    identity: ShopperIdentity,
    body: std::result::Result<Json<UpdateCartRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let Json(body) = body?;
    let (Some(id), Some(quantity)) = (body.cart_item_id, body.quantity) else {
        return Err(AppError::BadRequest(
            "Cart item ID and quantity are required".to_owned(),
        ));
    };

    CartService::new(state.store())
        .set_quantity(&identity.owner, id, quantity)
        .await?;
    Ok((
        AppendHeaders(identity.guest_cookie()),
        Json(json!({ "success": true })),
    ))
}

/// `DELETE /cart?id=`
#[instrument(skip(state, identity), fields(cart_owner))]
pub async fn remove<S: Store>(
    State(state): State<AppState<S>>,
    identity: ShopperIdentity,
    query: std::result::Result<Query<RemoveQuery>, QueryRejection>,
) -> Result<impl IntoResponse> {
    let Query(query) = query?;
    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Cart item ID is required".to_owned()))?;

    CartService::new(state.store())
        .remove(&identity.owner, id)
        .await?;
    Ok((
        AppendHeaders(identity.guest_cookie()),
        Json(json!({ "success": true })),
    ))
}
