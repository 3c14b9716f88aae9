//! Price type
//!
//! Domain primitive for subscription prices. Prices are validated at
//! construction time, so a zero or negative price cannot exist.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::DomainError;

/// Positive, currency-agnostic price magnitude.
///
/// # Example
/// ```
/// use subtrack::domain::Price;
///
/// let price: Price = "15.99".parse().unwrap();
/// assert_eq!(price.to_string(), "15.99");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Price(Decimal);

impl Price {
    /// Create a new Price.
    ///
    /// # Errors
    /// `DomainError::InvalidPrice` if value <= 0
    pub fn new(value: Decimal) -> Result<Self, DomainError> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidPrice(format!(
                "price must be positive (got {})",
                value
            )));
        }
        Ok(Self(value.normalize()))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Two decimal places, the way prices are shown to people. Half-cents
/// round away from zero.
impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cents = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        write!(f, "{:.2}", cents)
    }
}

impl FromStr for Price {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| DomainError::InvalidPrice(format!("'{}': {}", s, e)))?;
        Price::new(decimal)
    }
}

impl TryFrom<String> for Price {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Price::from_str(&value)
    }
}

/// Full precision, used for storage and JSON.
impl From<Price> for String {
    fn from(price: Price) -> Self {
        price.0.to_string()
    }
}
