//! Verification amount generation

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};
use std::ops::RangeInclusive;

use crate::money::Amount;

/// Cent range for each micro-deposit ($0.01 - $0.49)
pub const CENT_RANGE: RangeInclusive<i64> = 1..=49;

/// Two random deposits and the reversal that balances them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountSet {
    pub first: Amount,
    pub second: Amount,
    pub sum: Amount,
}

impl AmountSet {
    /// Build the set from two cent values; the sum is exact integer math
    pub fn from_cents(first: i64, second: i64) -> Self {
        Self {
            first: Amount::usd_cents(first),
            second: Amount::usd_cents(second),
            sum: Amount::usd_cents(first + second),
        }
    }

    /// The two deposited (push) amounts
    pub fn pushes(&self) -> [&Amount; 2] {
        [&self.first, &self.second]
    }

    /// Submission order: two pushes, then the pull for the sum
    pub fn all(&self) -> [&Amount; 3] {
        [&self.first, &self.second, &self.sum]
    }
}

/// Draw a balanced set from OS entropy.
///
/// Entropy failure panics inside `OsRng`; there is nothing sensible to retry.
pub fn generate() -> AmountSet {
    generate_with(&mut OsRng)
}

/// Draw a balanced set from the given cryptographic source
pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> AmountSet {
    let first = rng.gen_range(CENT_RANGE);
    let second = rng.gen_range(CENT_RANGE);
    AmountSet::from_cents(first, second)
}
