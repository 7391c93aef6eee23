//! Price arithmetic for carts and orders.
//!
//! All amounts are PKR held in [`Decimal`] so totals never pick up floating
//! point drift.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Subtotal of one line: unit price times quantity.
#[must_use]
pub fn line_subtotal(price: Decimal, quantity: i32) -> Decimal {
    price * Decimal::from(quantity)
}

/// Flat-rate shipping with a free-shipping threshold.
///
/// Orders whose merchandise subtotal reaches `free_threshold` ship free;
/// everything else pays `flat_fee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Decimal,
    /// Fee charged below the threshold.
    pub flat_fee: Decimal,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Decimal::from(3000),
            flat_fee: Decimal::from(200),
        }
    }
}

impl ShippingPolicy {
    /// Create a policy with explicit values.
    #[must_use]
    pub const fn new(free_threshold: Decimal, flat_fee: Decimal) -> Self {
        Self {
            free_threshold,
            flat_fee,
        }
    }

    /// Shipping fee for a merchandise subtotal.
    #[must_use]
    pub fn fee_for(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_threshold {
            Decimal::ZERO
        } else {
            self.flat_fee
        }
    }

    /// Amount the customer pays: subtotal plus shipping.
    #[must_use]
    pub fn total_for(&self, subtotal: Decimal) -> Decimal {
        subtotal + self.fee_for(subtotal)
    }
}
