use super::card::{Card, CardId, CardStatus};
use super::money::Amount;
use super::page::TransactionSort;
use crate::error::{BankError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub const MSG_BLOCKED: &str = "Cannot use blocked card";
pub const MSG_EXPIRED: &str = "Cannot use expired card";
pub const MSG_INSUFFICIENT_FUNDS: &str = "Insufficient funds";
pub const MSG_PROCESSING: &str = "Transaction in processing";
pub const MSG_STATUS_CHANGED: &str = "Status changed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    Pending,
    Success,
    Failed,
}

impl TransactionStatus {
    pub const ALL: [TransactionStatus; 3] = [
        TransactionStatus::Pending,
        TransactionStatus::Success,
        TransactionStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self> {
        TransactionStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BankError::bad_request(format!("Status {} does not exist", s.trim())))
    }
}

/// A reference to one side of a transfer, with the masked number captured at
/// creation so the ledger stays readable after the card is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRef {
    pub id: CardId,
    pub masked_number: String,
}

impl From<&Card> for CardRef {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            masked_number: card.number.masked(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub source: CardRef,
    pub target: CardRef,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl TransactionSort {
    /// Orders transactions by this field, breaking ties by id.
    pub fn compare(&self, a: &Transaction, b: &Transaction) -> Ordering {
        let primary = match self {
            TransactionSort::Timestamp => a.timestamp.cmp(&b.timestamp),
            TransactionSort::Amount => a.amount.cmp(&b.amount),
            TransactionSort::Id => Ordering::Equal,
        };
        primary.then(a.id.cmp(&b.id))
    }
}

/// A transaction about to be written; the store assigns the identifier.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub source: CardRef,
    pub target: CardRef,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl NewTransaction {
    pub fn into_transaction(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            source: self.source,
            target: self.target,
            amount: self.amount,
            timestamp: self.timestamp,
            status: self.status,
        }
    }
}

/// The business verdict of a transfer attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub status: TransactionStatus,
    pub message: &'static str,
}

impl TransferOutcome {
    const fn failed(message: &'static str) -> Self {
        Self {
            status: TransactionStatus::Failed,
            message,
        }
    }
}

/// Decides the outcome of moving `amount` from `source` to `target`.
///
/// Blocked cards are checked before expired cards, which are checked before
/// the balance.
pub fn assess(source: &Card, target: &Card, amount: Amount) -> TransferOutcome {
    let either = |status: CardStatus| source.status == status || target.status == status;

    if either(CardStatus::Blocked) {
        TransferOutcome::failed(MSG_BLOCKED)
    } else if either(CardStatus::Expired) {
        TransferOutcome::failed(MSG_EXPIRED)
    } else if !source.balance.covers(amount) {
        TransferOutcome::failed(MSG_INSUFFICIENT_FUNDS)
    } else {
        TransferOutcome {
            status: TransactionStatus::Pending,
            message: MSG_PROCESSING,
        }
    }
}

/// What a caller gets back from a transfer or a status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferReceipt {
    pub status: TransactionStatus,
    pub message: String,
}

/// Outward-facing ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionView {
    pub id: TransactionId,
    pub source_number: String,
    pub target_number: String,
    pub amount: Amount,
    pub timestamp: DateTime<Utc>,
    pub status: TransactionStatus,
}

impl From<&Transaction> for TransactionView {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id,
            source_number: tx.source.masked_number.clone(),
            target_number: tx.target.masked_number.clone(),
            amount: tx.amount,
            timestamp: tx.timestamp,
            status: tx.status,
        }
    }
}
