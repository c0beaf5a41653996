use crate::domain::card::CardView;
use crate::domain::transaction::TransactionView;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct CardRow<'a> {
    id: u64,
    number: &'a str,
    owner: &'a str,
    expiration: String,
    balance: String,
    status: &'static str,
}

#[derive(Serialize)]
struct TransactionRow<'a> {
    id: u64,
    source: &'a str,
    target: &'a str,
    amount: String,
    timestamp: String,
    status: &'static str,
}

/// Writes final state reports as CSV. Card numbers are always masked.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    /// Creates a report writer emitting CSV into `sink`.
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_cards(&mut self, cards: &[CardView]) -> Result<()> {
        if cards.is_empty() {
            self.writer
                .write_record(["id", "number", "owner", "expiration", "balance", "status"])?;
        }
        for card in cards {
            self.writer.serialize(CardRow {
                id: card.id.0,
                number: &card.masked_number,
                owner: &card.owner,
                expiration: card.expiration.to_string(),
                balance: card.balance.to_string(),
                status: card.status.as_str(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_transactions(&mut self, transactions: &[TransactionView]) -> Result<()> {
        if transactions.is_empty() {
            self.writer
                .write_record(["id", "source", "target", "amount", "timestamp", "status"])?;
        }
        for tx in transactions {
            self.writer.serialize(TransactionRow {
                id: tx.id.0,
                source: &tx.source_number,
                target: &tx.target_number,
                amount: tx.amount.to_string(),
                timestamp: tx.timestamp.to_rfc3339(),
                status: tx.status.as_str(),
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
