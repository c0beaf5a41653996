//! Card status state machine used by moderation.
//!
//! The legal moves live in a single table indexed by `(from, to)`. `EXPIRED`
//! is terminal: moderation can neither enter nor leave it.

use super::card::{CardId, CardStatus};
use crate::error::BankError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    Allowed,
    AlreadyInState,
    CardExpired,
    UnsupportedTarget,
}

use Verdict::*;

// Rows: current status. Columns: requested status. Order: ACTIVE, BLOCKED, EXPIRED.
const TRANSITIONS: [[Verdict; 3]; 3] = [
    [AlreadyInState, Allowed, UnsupportedTarget],
    [Allowed, AlreadyInState, UnsupportedTarget],
    [CardExpired, CardExpired, UnsupportedTarget],
];

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("card is already {0}")]
    AlreadyInState(CardStatus),
    #[error("card is expired")]
    Expired,
    #[error("status {0} is not supported for moderation")]
    UnsupportedTarget(CardStatus),
}

impl TransitionError {
    /// Converts the rejection into a caller-facing error naming the card.
    pub fn into_bank_error(self, card: CardId) -> BankError {
        let message = match self {
            TransitionError::AlreadyInState(status) => format!(
                "Card with id={} is already {}",
                card,
                status.as_str().to_lowercase()
            ),
            TransitionError::Expired => format!("Card with id={} is expired", card),
            TransitionError::UnsupportedTarget(status) => {
                format!("Status {} is not supported for moderation", status)
            }
        };
        BankError::BadRequest(message)
    }
}

/// Checks whether moderation may move a card from `from` to `to`.
pub fn check_transition(from: CardStatus, to: CardStatus) -> Result<(), TransitionError> {
    match TRANSITIONS[from.index()][to.index()] {
        Allowed => Ok(()),
        AlreadyInState => Err(TransitionError::AlreadyInState(from)),
        CardExpired => Err(TransitionError::Expired),
        UnsupportedTarget => Err(TransitionError::UnsupportedTarget(to)),
    }
}
