use crate::error::BankError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of fraction digits carried by every monetary value.
pub const SCALE: u32 = 2;

/// Largest number of integer digits a transfer amount may have.
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 10;

/// A card balance: fixed-point, two fraction digits, never negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Balance(Decimal);

/// A positive transfer amount with at most 10 integer and 2 fraction digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Balance {
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, SCALE));

    pub fn new(value: Decimal) -> Result<Self, BankError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(BankError::bad_request("Balance cannot be negative"));
        }
        let mut value = value.round_dp(SCALE);
        value.rescale(SCALE);
        Ok(Self(value))
    }

    /// Builds a balance from a whole number of cents. Negative input clamps to zero.
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents.max(0), SCALE))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Whether this balance is large enough to fund `amount`.
    pub fn covers(&self, amount: Amount) -> bool {
        self.0 >= amount.0
    }
}

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, BankError> {
        if value <= Decimal::ZERO {
            return Err(BankError::bad_request("Amount must be positive"));
        }
        if value.normalize().scale() > SCALE {
            return Err(BankError::bad_request(
                "Amount must have up to 10 integer and 2 fraction digits",
            ));
        }
        if value.trunc() >= Decimal::from(10u64.pow(MAX_AMOUNT_INTEGER_DIGITS)) {
            return Err(BankError::bad_request(
                "Amount must have up to 10 integer and 2 fraction digits",
            ));
        }
        let mut value = value;
        value.rescale(SCALE);
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Balance {
    type Error = BankError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = BankError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Balance> for Decimal {
    fn from(balance: Balance) -> Self {
        balance.0
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|_| BankError::bad_request(format!("Invalid amount: {}", s)))?;
        Self::new(value)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
