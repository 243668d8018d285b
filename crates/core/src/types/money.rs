//! Monetary amounts with decimal arithmetic.

use core::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A monetary amount in the store currency (USD).
///
/// Wraps [`rust_decimal::Decimal`] so cart and order arithmetic is exact.
/// Amounts are expressed in currency units (dollars), with cents available
/// through [`Money::from_cents`] for fixture data and price snapshots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a money amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a money amount from an integer number of cents.
    ///
    /// ```
    /// use thockshop_core::Money;
    ///
    /// assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
    /// ```
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(Decimal::from_parts(
            // Decimal::new is not const; build the two-decimal-place value directly
            (cents.unsigned_abs() & 0xFFFF_FFFF) as u32,
            ((cents.unsigned_abs() >> 32) & 0xFFFF_FFFF) as u32,
            0,
            cents < 0,
            2,
        ))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether this amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Line total: this unit amount multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Subtraction that floors at zero.
    ///
    /// Used for discount application: a discount larger than the subtotal
    /// brings the total to zero, never negative.
    #[must_use]
    pub fn saturating_sub(&self, other: Self) -> Self {
        if other.0 >= self.0 {
            Self::ZERO
        } else {
            Self(self.0 - other.0)
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

// SQLx support (with postgres feature): NUMERIC column
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Money {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Money {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Money {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        assert_eq!(Money::from_cents(1000).to_string(), "$10.00");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(0), Money::ZERO);
    }

    #[test]
    fn test_times() {
        let unit = Money::from_cents(1000);
        assert_eq!(unit.times(2), Money::from_cents(2000));
        assert_eq!(unit.times(0), Money::ZERO);
    }

    #[test]
    fn test_sum() {
        let total: Money = [Money::from_cents(250), Money::from_cents(1749)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(1999));
    }

    #[test]
    fn test_saturating_sub() {
        let subtotal = Money::from_cents(2000);
        assert_eq!(
            subtotal.saturating_sub(Money::from_cents(500)),
            Money::from_cents(1500)
        );
        // A discount larger than the subtotal floors at zero
        assert_eq!(
            subtotal.saturating_sub(Money::from_cents(9999)),
            Money::ZERO
        );
    }

    #[test]
    fn test_display_rounds_to_cents() {
        let amount = Money::new(Decimal::new(12346, 3)); // 12.346
        assert_eq!(amount.to_string(), "$12.35");
    }

    #[test]
    fn test_serde_uses_string_representation() {
        let amount = Money::from_cents(1999);
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"19.99\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, amount);
    }
}
