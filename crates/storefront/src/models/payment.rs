//! Payment proofs uploaded for manual wallet and bank payments.

use chrono::{DateTime, Utc};
use serde::Serialize;

use zahra_core::{Email, OrderId, PaymentProofId, ProofDecision, VerificationStatus};

/// An uploaded payment proof and its review state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct PaymentProof {
    pub id: PaymentProofId,
    pub order_id: OrderId,
    pub proof_image_url: String,
    pub verification_status: VerificationStatus,
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A staff decision to record against a pending proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofVerification {
    pub decision: ProofDecision,
    pub verified_by: Option<Email>,
    pub verified_at: DateTime<Utc>,
}
