//! Human-readable payment amount parsing.
//!
//! [`Amount`] turns the caller's decimal string into a validated value and
//! renders the form that is sent to the wallet, keeping the caller's scale.
//!
//! # Supported Formats
//!
//! - Plain numbers: `"100"`, `"0.01"`
//! - With a leading currency symbol: `"$10.50"`, `"€20"`
//! - With thousand separators: `"1,000"`, `"1,000,000.50"`
//!
//! Anything else is rejected rather than guessed at: `"10,50"`, `"1e3"` and `"12abc"`
//! are all [`AmountParseError::InvalidFormat`].
//!
//! # Example
//!
//! ```rust
//! use setto_types::amount::Amount;
//!
//! let amount = Amount::parse("$1,000.50").unwrap();
//! assert_eq!(amount.to_string(), "1000.50");
//! ```

use regex::Regex;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

/// A validated, non-negative payment amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

/// Errors that can occur when parsing an amount.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountParseError {
    #[error("Invalid number format")]
    InvalidFormat,
    #[error(
        "Amount must be between {} and {}",
        constants::MIN_STR,
        constants::MAX_STR
    )]
    OutOfRange,
    #[error("Negative value is not allowed")]
    Negative,
}

mod constants {
    use super::*;

    pub const MIN_STR: &str = "0.000000001";
    pub const MAX_STR: &str = "999999999";

    pub static MIN: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MIN_STR).expect("valid decimal"));
    pub static MAX: LazyLock<Decimal> =
        LazyLock::new(|| Decimal::from_str(MAX_STR).expect("valid decimal"));
}

/// Optional sign, optional short currency symbol, then a decimal whose integer part is
/// either plain digits or grouped by commas in threes.
static FORMAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<sign>-)?\s*(?:[^\d\s.,\-]{1,3}\s*)?(?P<number>\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?)$",
    )
    .expect("valid regex")
});

impl Amount {
    /// Parses a human-readable amount.
    pub fn parse(input: &str) -> Result<Self, AmountParseError> {
        let captures = FORMAT
            .captures(input.trim())
            .ok_or(AmountParseError::InvalidFormat)?;
        let number = captures["number"].replace(',', "");
        let parsed = Decimal::from_str(&number).map_err(|_| AmountParseError::InvalidFormat)?;

        if captures.name("sign").is_some() && !parsed.is_zero() {
            return Err(AmountParseError::Negative);
        }
        if parsed < *constants::MIN || parsed > *constants::MAX {
            return Err(AmountParseError::OutOfRange);
        }
        Ok(Amount(parsed))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
