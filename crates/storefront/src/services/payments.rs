//! Payment-proof intake and staff verification.

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use zahra_core::{Email, OrderNumber, PaymentProofId, ProofDecision};

use crate::db::{RepositoryError, Store};
use crate::models::{PaymentProof, ProofVerification};
use crate::services::uploads::{UploadError, UploadStorage};

/// Errors from proof submission and review.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Order number is required")]
    MissingOrderNumber,
    #[error("Order not found")]
    OrderNotFound,
    #[error("Payment proof not found")]
    ProofNotFound,
    #[error("Payment proof has already been reviewed")]
    AlreadyReviewed,
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Payment service scoped to a store and upload directory.
pub struct PaymentService<'a, S> {
    store: &'a S,
    uploads: &'a UploadStorage,
}

impl<'a, S: Store> PaymentService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, uploads: &'a UploadStorage) -> Self {
        Self { store, uploads }
    }

    /// Store an uploaded proof and mark the order `proof_uploaded`.
    ///
    /// The order is resolved before the file is written so unknown orders
    /// never leave files behind.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::OrderNotFound` for unknown order numbers and
    /// `PaymentError::Upload` if the file is rejected or cannot be stored.
    pub async fn submit_proof(
        &self,
        order_number: &str,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<PaymentProof, PaymentError> {
        if order_number.trim().is_empty() {
            return Err(PaymentError::MissingOrderNumber);
        }
        let number = OrderNumber::parse(order_number).map_err(|_| PaymentError::OrderNotFound)?;
        let order = self
            .store
            .find_order_by_number(&number)
            .await?
            .ok_or(PaymentError::OrderNotFound)?;

        let image_url = self.uploads.store(content_type, data).await?;
        let proof = match self.store.attach_payment_proof(order.id, &image_url).await {
            Ok(proof) => proof,
            Err(e) => {
                self.uploads.discard(&image_url).await;
                return Err(match e {
                    RepositoryError::NotFound => PaymentError::OrderNotFound,
                    other => PaymentError::Repository(other),
                });
            }
        };

        info!(
            order_number = %order.order_number,
            proof_id = %proof.id,
            "Payment proof uploaded"
        );
        Ok(proof)
    }

    /// Record a staff decision on a pending proof.
    ///
    /// Approval also confirms the order's payment in the same write.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::ProofNotFound` for unknown proofs and
    /// `PaymentError::AlreadyReviewed` if a decision was already recorded.
    pub async fn verify(
        &self,
        proof_id: PaymentProofId,
        decision: ProofDecision,
        verified_by: Option<Email>,
    ) -> Result<PaymentProof, PaymentError> {
        let verification = ProofVerification {
            decision,
            verified_by,
            verified_at: Utc::now(),
        };
        let proof = self
            .store
            .record_proof_decision(proof_id, &verification)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => PaymentError::AlreadyReviewed,
                other => PaymentError::Repository(other),
            })?
            .ok_or(PaymentError::ProofNotFound)?;

        info!(
            proof_id = %proof.id,
            order_id = %proof.order_id,
            decision = ?decision,
            verified_by = proof.verified_by.as_deref().unwrap_or("-"),
            "Payment proof reviewed"
        );
        Ok(proof)
    }
}
