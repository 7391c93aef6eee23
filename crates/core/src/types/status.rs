//! Status and method enums for orders and payment proofs.
//!
//! Each enum maps to a Postgres enum type of the same snake_case name when the
//! `postgres` feature is enabled, and to snake_case strings over JSON.

use serde::{Deserialize, Serialize};

/// Where an order is in its fulfilment lifecycle.
///
/// ```text
/// pending ──► processing ──► shipped ──► delivered
///    │            │             │
///    └────────────┴─────────────┴──► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Whether moving from `self` to `next` follows the order lifecycle.
    ///
    /// Re-applying the current status is accepted as a no-op.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Pending | Self::Processing | Self::Cancelled)
                | (Self::Processing, Self::Processing | Self::Shipped | Self::Cancelled)
                | (Self::Shipped, Self::Shipped | Self::Delivered | Self::Cancelled)
                | (Self::Delivered, Self::Delivered)
                | (Self::Cancelled, Self::Cancelled)
        )
    }

    /// Delivered and cancelled orders accept no further changes.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Payment progress of an order.
///
/// Manual payments move `pending → proof_uploaded → confirmed`; the last step
/// only happens when staff approve the uploaded proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    ProofUploaded,
    Confirmed,
}

impl PaymentStatus {
    /// The snake_case wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::ProofUploaded => "proof_uploaded",
            Self::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "payment_method", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery.
    Cod,
    /// `JazzCash` mobile wallet.
    JazzCash,
    /// Easypaisa mobile wallet.
    Easypaisa,
    /// Direct bank transfer.
    Bank,
}

impl PaymentMethod {
    /// Wallet and bank payments are settled out of band and need a proof upload.
    #[must_use]
    pub const fn requires_proof(self) -> bool {
        !matches!(self, Self::Cod)
    }

    /// The lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::JazzCash => "jazzcash",
            Self::Easypaisa => "easypaisa",
            Self::Bank => "bank",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "jazzcash" => Ok(Self::JazzCash),
            "easypaisa" => Ok(Self::Easypaisa),
            "bank" => Ok(Self::Bank),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Staff review state of an uploaded payment proof.
///
/// `pending` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "verification_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    /// Whether a staff decision has already been recorded.
    #[must_use]
    pub const fn is_decided(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// A staff decision on a pending payment proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofDecision {
    Approved,
    Rejected,
}

impl From<ProofDecision> for VerificationStatus {
    fn from(decision: ProofDecision) -> Self {
        match decision {
            ProofDecision::Approved => Self::Approved,
            ProofDecision::Rejected => Self::Rejected,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_allows_forward_steps_and_cancellation() {
        use OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        for from in [Pending, Processing, Shipped] {
            assert!(from.can_transition_to(Cancelled), "{from} -> cancelled");
        }
    }

    #[test]
    fn lifecycle_rejects_skips_and_reversals() {
        use OrderStatus::{Cancelled, Delivered, Pending, Processing, Shipped};

        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Delivered.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn same_status_is_a_no_op() {
        for status in OrderStatus::ALL {
            assert!(status.can_transition_to(status));
        }
    }

    #[test]
    fn terminal_states() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Shipped.is_terminal());
    }

    #[test]
    fn wire_names_match_serde() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert_eq!(
            serde_json::to_string(&PaymentStatus::ProofUploaded).unwrap(),
            "\"proof_uploaded\""
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"jazzcash\"").unwrap(),
            PaymentMethod::JazzCash
        );
    }

    #[test]
    fn only_cash_on_delivery_skips_proof() {
        assert!(!PaymentMethod::Cod.requires_proof());
        assert!(PaymentMethod::JazzCash.requires_proof());
        assert!(PaymentMethod::Easypaisa.requires_proof());
        assert!(PaymentMethod::Bank.requires_proof());
    }

    #[test]
    fn decisions_map_to_terminal_verification_states() {
        let approved: VerificationStatus = ProofDecision::Approved.into();
        let rejected: VerificationStatus = ProofDecision::Rejected.into();
        assert!(approved.is_decided());
        assert!(rejected.is_decided());
        assert!(!VerificationStatus::Pending.is_decided());
        assert!(serde_json::from_str::<ProofDecision>("\"pending\"").is_err());
    }
}
