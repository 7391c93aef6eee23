//! Payment proof repository.

use sqlx::PgPool;

use zahra_core::{OrderId, PaymentProofId, PaymentStatus, VerificationStatus};

use super::RepositoryError;
use crate::models::{PaymentProof, ProofVerification};

/// Repository for payment proof database operations.
pub struct PaymentProofRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PaymentProofRepository<'a> {
    /// Create a new payment proof repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the most recent proof for an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        let proof = sqlx::query_as::<_, PaymentProof>(
            "SELECT * FROM payment_proofs WHERE order_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(proof)
    }

    /// Get a proof by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PaymentProofId) -> Result<Option<PaymentProof>, RepositoryError> {
        let proof = sqlx::query_as::<_, PaymentProof>("SELECT * FROM payment_proofs WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(proof)
    }

    /// Insert a pending proof and mark the order `proof_uploaded`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn attach(
        &self,
        order_id: OrderId,
        image_url: &str,
    ) -> Result<PaymentProof, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE orders SET payment_status = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(PaymentStatus::ProofUploaded)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let proof = sqlx::query_as::<_, PaymentProof>(
            "INSERT INTO payment_proofs (order_id, proof_image_url) VALUES ($1, $2) RETURNING *",
        )
        .bind(order_id)
        .bind(image_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(proof)
    }

    /// Record a staff decision on a pending proof.
    ///
    /// The proof row is locked for the duration of the transaction so two
    /// reviewers cannot both decide it. Approval also sets the order's
    /// payment status to `confirmed`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the proof was already decided.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn record_decision(
        &self,
        id: PaymentProofId,
        verification: &ProofVerification,
    ) -> Result<Option<PaymentProof>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, (VerificationStatus,)>(
            "SELECT verification_status FROM payment_proofs WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((status,)) = current else {
            return Ok(None);
        };
        if status.is_decided() {
            return Err(RepositoryError::Conflict(
                "payment proof has already been reviewed".to_owned(),
            ));
        }

        let status = VerificationStatus::from(verification.decision);
        let proof = sqlx::query_as::<_, PaymentProof>(
            r"
            UPDATE payment_proofs
            SET verification_status = $1, verified_by = $2, verified_at = $3
            WHERE id = $4
            RETURNING *
            ",
        )
        .bind(status)
        .bind(verification.verified_by.as_ref().map(|email| email.as_str()))
        .bind(verification.verified_at)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if status == VerificationStatus::Approved {
            sqlx::query("UPDATE orders SET payment_status = $1, updated_at = NOW() WHERE id = $2")
                .bind(PaymentStatus::Confirmed)
                .bind(proof.order_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(Some(proof))
    }
}
