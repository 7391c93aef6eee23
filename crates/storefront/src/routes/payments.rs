//! Payment-proof upload handler.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::Store;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::routes::multipart::MultipartForm;
use crate::services::payments::PaymentService;
use crate::state::AppState;

/// `POST /payment-proof` (multipart: `orderNumber`, `file`)
///
/// Responds with `{success, fileUrl}`.
#[instrument(skip(state, multipart))]
pub async fn submit<S: Store>(
    State(state): State<AppState<S>>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>> {
    let mut form = MultipartForm::collect(multipart?).await?;
    let order_number = form.take("orderNumber").filter(|n| !n.trim().is_empty());
    let (Some(order_number), Some(file)) = (order_number, form.file) else {
        return Err(AppError::BadRequest(
            "Order number and file are required".to_owned(),
        ));
    };

    let proof = PaymentService::new(state.store(), state.uploads())
        .submit_proof(&order_number, file.content_type.as_deref(), &file.data)
        .await?;

    add_breadcrumb(
        "payment",
        "Payment proof uploaded",
        Some(&[("order_number", order_number.as_str())]),
    );
    Ok(Json(json!({ "success": true, "fileUrl": proof.proof_image_url })))
}
