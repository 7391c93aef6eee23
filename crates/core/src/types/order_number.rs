//! Human-facing order numbers.
//!
//! Format: `ORD-<millis since epoch, base 36>-<5 random base-36 chars>`, all
//! uppercase, e.g. `ORD-LZ3K9Q1A-7XK2P`. The internal row id is never shown to
//! customers.

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const PREFIX: &str = "ORD";
const SUFFIX_LEN: usize = 5;
const RADIX: u32 = 36;

/// Errors from [`OrderNumber::parse`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("order number must look like ORD-<timestamp>-<suffix>")]
    Malformed,
}

/// A generated order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate an order number for the given instant.
    ///
    /// Two numbers generated in the same millisecond differ only by their
    /// random suffix; callers that need uniqueness must still rely on the
    /// database constraint.
    #[must_use]
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| base36_digit(rng.random_range(0..RADIX)))
            .collect();
        Self(format!("{PREFIX}-{}-{suffix}", to_base36(millis)))
    }

    /// Validate the shape of a customer-supplied order number.
    ///
    /// Lowercase input is accepted and uppercased.
    ///
    /// # Errors
    ///
    /// Returns [`OrderNumberError::Malformed`] when the input does not have
    /// the `ORD-<timestamp>-<suffix>` shape.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let upper = s.trim().to_ascii_uppercase();
        let mut parts = upper.split('-');
        let (Some(prefix), Some(stamp), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(OrderNumberError::Malformed);
        };

        let is_base36 = |part: &str| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric())
        };
        if prefix != PREFIX || !is_base36(stamp) || !is_base36(suffix) {
            return Err(OrderNumberError::Malformed);
        }

        Ok(Self(upper))
    }

    /// Wrap a value read back from storage.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn base36_digit(value: u32) -> char {
    char::from_digit(value % RADIX, RADIX)
        .unwrap_or('0')
        .to_ascii_uppercase()
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while value > 0 {
        let digit = u32::try_from(value % u64::from(RADIX)).unwrap_or(0);
        digits.push(base36_digit(digit));
        value /= u64::from(RADIX);
    }
    digits.iter().rev().collect()
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
