//! Checkout and order-tracking handlers.

use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::Store;
use crate::error::{Result, add_breadcrumb};
use crate::models::OrderDetail;
use crate::services::orders::{CheckoutRequest, OrderService};
use crate::state::AppState;

/// `GET /orders` query string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLookup {
    #[serde(default)]
    pub order_number: String,
}

/// `POST /orders`
///
/// Responds with `{success, order, orderNumber}`.
#[instrument(skip(state, body))]
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    body: std::result::Result<Json<CheckoutRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(request) = body?;
    let order = OrderService::new(state.store(), state.shipping())
        .place_order(request)
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[
            ("order_number", order.order_number.as_str()),
            ("payment_method", order.payment_method.as_str()),
        ]),
    );
    let order_number = order.order_number.clone();
    Ok(Json(json!({
        "success": true,
        "order": order,
        "orderNumber": order_number,
    })))
}

/// `GET /orders?orderNumber=`
#[instrument(skip(state))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    query: std::result::Result<Query<OrderLookup>, QueryRejection>,
) -> Result<Json<OrderDetail>> {
    let Query(lookup) = query?;
    let detail = OrderService::new(state.store(), state.shipping())
        .order_detail(&lookup.order_number)
        .await?;
    Ok(Json(detail))
}
