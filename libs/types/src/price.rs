//! Fixed-point price type
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Prices are strictly positive and carry at most 2 fractional digits;
//! construction rounds half-up.

use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of fractional digits a price carries.
pub const PRICE_DP: u32 = 2;

/// Price type with fixed-point decimal representation
///
/// Must always be positive. Serialized as string to prevent JSON number
/// precision loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price from a Decimal, rounding to 2 fractional digits
    ///
    /// # Panics
    /// Panics if the price is negative or zero
    pub fn new(value: Decimal) -> Self {
        Self::try_new(value).expect("Price must be positive")
    }

    /// Try to create a Price, returning None if the rounded value is not positive
    pub fn try_new(value: Decimal) -> Option<Self> {
        let rounded = value.round_dp_with_strategy(PRICE_DP, RoundingStrategy::MidpointAwayFromZero);
        if rounded > Decimal::ZERO {
            Some(Self(rounded))
        } else {
            None
        }
    }

    /// Create from integer (for testing/convenience)
    pub fn from_u64(value: u64) -> Self {
        Self::new(Decimal::from(value))
    }

    /// Create from string
    pub fn from_str(s: &str) -> Result<Self, rust_decimal::Error> {
        let decimal = Decimal::from_str(s)?;
        Ok(Self::new(decimal))
    }

    /// Get the inner decimal value
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Notional value of `quantity` shares at this price
    pub fn notional(&self, quantity: i64) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

// Custom serialization to preserve precision
impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let decimal = Decimal::from_str(&s).map_err(serde::de::Error::custom)?;
        Self::try_new(decimal).ok_or_else(|| serde::de::Error::custom("Price must be positive"))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_creation() {
        let price = Price::from_u64(100);
        assert_eq!(price.as_decimal(), Decimal::from(100));
    }

    #[test]
    #[should_panic(expected = "Price must be positive")]
    fn test_price_negative_panics() {
        Price::new(Decimal::from(-100));
    }

    #[test]
    fn test_price_rounds_to_two_digits() {
        let price = Price::from_str("100.005").unwrap();
        assert_eq!(price.to_string(), "100.01");

        let price = Price::from_str("99.994").unwrap();
        assert_eq!(price.to_string(), "99.99");
    }

    #[test]
    fn test_price_rounds_to_zero_rejected() {
        assert!(Price::try_new(Decimal::from_str("0.001").unwrap()).is_none());
    }

    #[test]
    fn test_price_ordering() {
        let p1 = Price::from_u64(100);
        let p2 = Price::from_str("100.50").unwrap();
        assert!(p1 < p2);
    }

    #[test]
    fn test_price_notional() {
        let price = Price::from_str("10.50").unwrap();
        assert_eq!(price.notional(4), Decimal::from(42));
    }

    #[test]
    fn test_price_serialization() {
        let price = Price::from_str("105.25").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        assert_eq!(json, "\"105.25\"");

        let deserialized: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(price, deserialized);
    }

    #[test]
    fn test_deterministic_notional() {
        // Same inputs always produce the same output
        let p1 = Price::from_str("123.45").unwrap();
        let p2 = Price::from_str("123.45").unwrap();
        assert_eq!(p1.notional(789), p2.notional(789));
    }
}
