//! Money Module
//!
//! `Amount` is the single representation of a currency value in paygate.
//! Values are held as integer cents; all parsing and formatting goes through
//! this module so that micro-deposit sums never suffer rounding drift.
//!
//! ## Textual form
//! - Canonical: `"USD 0.12"` (what is persisted and returned by the admin API)
//! - Also accepted on input: a bare `"0.12"` (currency defaults to USD)
//!
//! ```rust
//! use paygate::money::Amount;
//!
//! let a: Amount = "USD 0.12".parse().unwrap();
//! let b: Amount = "0.07".parse().unwrap();
//! assert_eq!(a.checked_add(&b).unwrap().to_string(), "USD 0.19");
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default currency for every amount handled here
pub const USD: &str = "USD";

const CENT_DECIMALS: u32 = 2;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Invalid amount format: {0}")]
    InvalidFormat(String),

    #[error("Precision overflow: provided {provided} decimals, max allowed {max}")]
    PrecisionOverflow { provided: u32, max: u32 },

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Amount too large, would overflow")]
    Overflow,

    #[error("Currency mismatch: {0} vs {1}")]
    CurrencyMismatch(String, String),
}

// ============================================================================
// Amount
// ============================================================================

/// Signed currency amount in integer cents
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Amount {
    currency: String,
    cents: i64,
}

impl Amount {
    /// USD amount from integer cents
    pub fn usd_cents(cents: i64) -> Self {
        Self {
            currency: USD.to_string(),
            cents,
        }
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Value in cents (the unit used by the ledger service)
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Decimal view, e.g. `0.12`
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.cents, CENT_DECIMALS)
    }

    pub fn checked_add(&self, other: &Amount) -> Result<Amount, MoneyError> {
        if self.currency != other.currency {
            return Err(MoneyError::CurrencyMismatch(
                self.currency.clone(),
                other.currency.clone(),
            ));
        }
        let cents = self
            .cents
            .checked_add(other.cents)
            .ok_or(MoneyError::Overflow)?;
        Ok(Amount {
            currency: self.currency.clone(),
            cents,
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.2}", self.currency, self.to_decimal())
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (currency, value) = match s.split_once(' ') {
            Some((cur, value)) => (cur.trim().to_uppercase(), value.trim()),
            None => (USD.to_string(), s),
        };
        if currency != USD {
            return Err(MoneyError::UnsupportedCurrency(currency));
        }
        if value.is_empty() {
            return Err(MoneyError::InvalidFormat(s.to_string()));
        }

        let decimal =
            Decimal::from_str(value).map_err(|_| MoneyError::InvalidFormat(s.to_string()))?;

        // Reject instead of truncating: "0.125" is not a valid cent amount
        let scale = decimal.normalize().scale();
        if scale > CENT_DECIMALS {
            return Err(MoneyError::PrecisionOverflow {
                provided: scale,
                max: CENT_DECIMALS,
            });
        }

        let cents = (decimal * Decimal::from(100))
            .to_i64()
            .ok_or(MoneyError::Overflow)?;
        Ok(Amount { currency, cents })
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Typed parse result
// ============================================================================

/// Outcome of parsing an untrusted amount string.
///
/// Callers that tolerate bad input (confirmation guesses, admin listing of
/// stored rows) filter on this explicitly instead of swallowing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAmount {
    Valid(Amount),
    Malformed { raw: String, reason: MoneyError },
}

impl ParsedAmount {
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<Amount>() {
            Ok(amount) => ParsedAmount::Valid(amount),
            Err(reason) => ParsedAmount::Malformed {
                raw: raw.to_string(),
                reason,
            },
        }
    }

    /// Keep valid amounts, log and drop malformed ones
    pub fn into_valid(self, context: &str) -> Option<Amount> {
        match self {
            ParsedAmount::Valid(amount) => Some(amount),
            ParsedAmount::Malformed { raw, reason } => {
                tracing::debug!(context, raw = %raw, "dropping malformed amount: {}", reason);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_bare() {
        assert_eq!("USD 0.12".parse::<Amount>().unwrap().cents(), 12);
        assert_eq!("0.07".parse::<Amount>().unwrap().cents(), 7);
        assert_eq!("usd 1.5".parse::<Amount>().unwrap().cents(), 150);
        assert_eq!(" 0.49 ".parse::<Amount>().unwrap().cents(), 49);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(
            "0.125".parse::<Amount>(),
            Err(MoneyError::PrecisionOverflow { provided: 3, max: 2 })
        ));
        assert!(matches!(
            "EUR 0.12".parse::<Amount>(),
            Err(MoneyError::UnsupportedCurrency(_))
        ));
        assert!("abc".parse::<Amount>().is_err());
        assert!("".parse::<Amount>().is_err());
        assert!("USD ".parse::<Amount>().is_err());
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Amount::usd_cents(1).to_string(), "USD 0.01");
        assert_eq!(Amount::usd_cents(98).to_string(), "USD 0.98");
        assert_eq!(Amount::usd_cents(1250).to_string(), "USD 12.50");
    }

    #[test]
    fn test_checked_add_is_exact() {
        let sum = Amount::usd_cents(12)
            .checked_add(&Amount::usd_cents(7))
            .unwrap();
        assert_eq!(sum, Amount::usd_cents(19));
        assert_eq!(sum, "0.19".parse().unwrap());
    }

    #[test]
    fn test_parsed_amount_filters_malformed() {
        let parsed: Vec<Amount> = ["0.12", "nope", "USD 0.07"]
            .iter()
            .map(|s| ParsedAmount::parse(s))
            .filter_map(|p| p.into_valid("test"))
            .collect();
        assert_eq!(parsed, vec![Amount::usd_cents(12), Amount::usd_cents(7)]);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Amount::usd_cents(19)).unwrap();
        assert_eq!(json, "\"USD 0.19\"");
        let back: Amount = serde_json::from_str(&json).unwrap();
        assert_eq!(back.cents(), 19);
    }
}
