use crate::domain::money::Balance;
use crate::error::{BankError, Result};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// How a freshly issued card gets its starting balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpeningBalance {
    Fixed(Balance),
    /// Uniformly drawn in cents from `[min, max]`.
    Random { min: Balance, max: Balance },
}

impl Default for OpeningBalance {
    fn default() -> Self {
        OpeningBalance::Random {
            min: Balance::ZERO,
            max: Balance::from_cents(5_000_000),
        }
    }
}

impl OpeningBalance {
    /// Rejects a random range that is empty or cannot be drawn in cents.
    pub fn validate(&self) -> Result<()> {
        if let OpeningBalance::Random { min, max } = *self {
            if min > max {
                return Err(BankError::Config(format!(
                    "Opening balance range is empty: {} > {}",
                    min, max
                )));
            }
            cents(min)?;
            cents(max)?;
        }
        Ok(())
    }

    pub fn draw(&self) -> Result<Balance> {
        match *self {
            OpeningBalance::Fixed(balance) => Ok(balance),
            OpeningBalance::Random { min, max } => {
                self.validate()?;
                let (low, high) = (cents(min)?, cents(max)?);
                let drawn = rand::thread_rng().gen_range(low..=high);
                Ok(Balance::from_cents(drawn))
            }
        }
    }
}

fn cents(balance: Balance) -> Result<i64> {
    balance
        .value()
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|c| c.to_i64())
        .ok_or_else(|| BankError::Config(format!("Opening balance {} is out of range", balance)))
}
