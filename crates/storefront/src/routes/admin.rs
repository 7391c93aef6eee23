//! Staff handlers: dashboard, orders, products and payment-proof review.
//!
//! These routes are not gated by a staff role; deployments put them behind
//! an authenticating proxy.

use axum::{
    Json,
    extract::{
        Multipart, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use zahra_core::{
    Email, OrderId, OrderStatus, PaymentProofId, PaymentStatus, ProductId, ProofDecision,
};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::{DashboardStats, OrderUpdate};
use crate::routes::multipart::MultipartForm;
use crate::services::catalog::{CatalogService, ProductForm, ProductImage};
use crate::services::orders::OrderService;
use crate::services::payments::PaymentService;
use crate::state::AppState;

/// `GET /admin/orders` query string.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

/// `PUT /admin/orders` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusRequest {
    pub order_id: Option<OrderId>,
    pub order_status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// `DELETE /admin/products` query string.
#[derive(Debug, Deserialize)]
pub struct ProductIdQuery {
    pub id: Option<ProductId>,
}

/// `PUT /admin/payment-proofs` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofReviewRequest {
    pub proof_id: Option<PaymentProofId>,
    pub status: Option<ProofDecision>,
    pub admin_email: Option<String>,
}

/// `GET /admin/stats`
#[instrument(skip(state))]
pub async fn stats<S: Store>(State(state): State<AppState<S>>) -> Result<Json<DashboardStats>> {
    Ok(Json(state.store().dashboard_stats().await?))
}

/// `GET /admin/orders?status=`
#[instrument(skip(state))]
pub async fn list_orders<S: Store>(
    State(state): State<AppState<S>>,
    query: std::result::Result<Query<OrderListQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let status = query
        .status
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<OrderStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let orders = OrderService::new(state.store(), state.shipping())
        .list(status)
        .await?;
    Ok(Json(json!({ "orders": orders })))
}

/// `PUT /admin/orders`
#[instrument(skip(state))]
pub async fn update_order<S: Store>(
    State(state): State<AppState<S>>,
    body: std::result::Result<Json<OrderStatusRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let id = body
        .order_id
        .ok_or_else(|| AppError::BadRequest("Order ID is required".to_owned()))?;

    let order = OrderService::new(state.store(), state.shipping())
        .update_status(
            id,
            OrderUpdate {
                order_status: body.order_status,
                payment_status: body.payment_status,
            },
        )
        .await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// `POST /admin/products` (multipart)
#[instrument(skip(state, multipart))]
pub async fn create_product<S: Store>(
    State(state): State<AppState<S>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut form = MultipartForm::collect(multipart?).await?;
    let fields = product_form(&mut form);
    let image = form.file.as_ref().map(|file| ProductImage {
        content_type: file.content_type.as_deref(),
        data: &file.data,
    });

    let product = CatalogService::new(state.store(), state.uploads())
        .create(fields, image)
        .await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

/// `PUT /admin/products` (multipart, `productId` required)
#[instrument(skip(state, multipart))]
pub async fn update_product<S: Store>(
    State(state): State<AppState<S>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut form = MultipartForm::collect(multipart?).await?;
    let fields = product_form(&mut form);
    let image = form.file.as_ref().map(|file| ProductImage {
        content_type: file.content_type.as_deref(),
        data: &file.data,
    });

    let product = CatalogService::new(state.store(), state.uploads())
        .update(fields, image)
        .await?;
    Ok(Json(json!({ "success": true, "product": product })))
}

/// `DELETE /admin/products?id=`
#[instrument(skip(state))]
pub async fn delete_product<S: Store>(
    State(state): State<AppState<S>>,
    query: std::result::Result<Query<ProductIdQuery>, QueryRejection>,
) -> Result<Json<Value>> {
    let Query(query) = query?;
    let id = query
        .id
        .ok_or_else(|| AppError::BadRequest("Product ID is required".to_owned()))?;

    CatalogService::new(state.store(), state.uploads())
        .delete(id)
        .await?;
    Ok(Json(json!({ "success": true })))
}

/// `PUT /admin/payment-proofs`
///
/// The verifier is `adminEmail` when given, otherwise the signed-in user.
#[instrument(skip(state, user))]
pub async fn review_payment_proof<S: Store>(
    State(state): State<AppState<S>>,
    OptionalAuth(user): OptionalAuth,
    body: std::result::Result<Json<ProofReviewRequest>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(body) = body?;
    let (Some(proof_id), Some(decision)) = (body.proof_id, body.status) else {
        return Err(AppError::BadRequest(
            "Proof ID and status are required".to_owned(),
        ));
    };
    let verified_by = match body.admin_email.filter(|e| !e.trim().is_empty()) {
        Some(email) => Some(
            Email::parse(&email)
                .map_err(|e| AppError::BadRequest(format!("Invalid admin email: {e}")))?,
        ),
        None => user.map(|user| user.email),
    };

    let proof = PaymentService::new(state.store(), state.uploads())
        .verify(proof_id, decision, verified_by)
        .await?;
    Ok(Json(json!({ "success": true, "paymentProof": proof })))
}

fn product_form(form: &mut MultipartForm) -> ProductForm {
    ProductForm {
        product_id: form.take("productId"),
        name: form.take("name"),
        description: form.take("description"),
        price: form.take("price"),
        category_id: form.take("categoryId"),
        stock_quantity: form.take("stockQuantity"),
        is_featured: form.take("isFeatured"),
    }
}
