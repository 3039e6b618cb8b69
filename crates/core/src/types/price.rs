//! Type-safe listing price using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price must not be negative")]
    Negative,
    /// The input string is not a valid decimal number.
    #[error("price is not a valid number")]
    NotANumber,
}

/// A non-negative listing price.
///
/// Listings are single-currency, so no currency code travels with the amount.
/// The decimal representation avoids float rounding on display and comparison.
///
/// ## Examples
///
/// ```
/// use tradepost_core::Price;
///
/// let price: Price = "1250.50".parse().unwrap();
/// assert!("-1".parse::<Price>().is_err());
/// assert!("cheap".parse::<Price>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| PriceError::NotANumber)?;
        Self::new(amount)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

// SQLx support (with postgres feature): stored as NUMERIC
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        // The column carries a CHECK (>= 0); trust it
        Ok(Self(amount))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
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
    fn test_zero_is_valid() {
        assert!(Price::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_negative_is_rejected() {
        let amount = Decimal::from_str("-0.01").unwrap();
        assert_eq!(Price::new(amount), Err(PriceError::Negative));
    }

    #[test]
    fn test_parse_valid() {
        let price: Price = "1250.50".parse().unwrap();
        assert_eq!(price.amount(), Decimal::from_str("1250.50").unwrap());
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let price: Price = " 99 ".parse().unwrap();
        assert_eq!(price.amount(), Decimal::from(99));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!("cheap".parse::<Price>(), Err(PriceError::NotANumber));
        assert_eq!("".parse::<Price>(), Err(PriceError::NotANumber));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!("-1".parse::<Price>(), Err(PriceError::Negative));
    }

    #[test]
    fn test_ordering() {
        let low: Price = "10".parse().unwrap();
        let high: Price = "20".parse().unwrap();
        assert!(low < high);
    }
}
