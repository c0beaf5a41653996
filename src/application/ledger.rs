use crate::domain::card::CardId;
use crate::domain::page::{PageRequest, TransactionSort};
use crate::domain::ports::{SharedCardStore, SharedTransactionStore};
use crate::domain::transaction::{
    MSG_STATUS_CHANGED, TransactionId, TransactionStatus, TransactionView, TransferReceipt,
};
use crate::error::{BankError, Result};

/// Status reconciliation and queries over recorded transactions.
#[derive(Clone)]
pub struct TransactionLedger {
    transactions: SharedTransactionStore,
    cards: SharedCardStore,
}

impl TransactionLedger {
    pub fn new(transactions: SharedTransactionStore, cards: SharedCardStore) -> Self {
        Self {
            transactions,
            cards,
        }
    }

    /// Overwrites a transaction's status. Any status may follow any other,
    /// but setting the current one again is rejected and writes nothing.
    pub async fn set_status(
        &self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<TransferReceipt> {
        let mut tx = self.transactions.find_by_id(id).await?.ok_or_else(|| {
            tracing::error!(tx_id = %id, "Transaction not found");
            BankError::not_found(format!("Transaction with id={} not found", id))
        })?;
        if tx.status == status {
            tracing::warn!(tx_id = %id, %status, "Status unchanged");
            return Err(BankError::bad_request(format!(
                "Transaction status is already {}",
                status
            )));
        }

        let previous = tx.status;
        tx.status = status;
        self.transactions.save(&tx).await?;
        tracing::info!(tx_id = %id, from = %previous, to = %status, "Transaction status changed");
        Ok(TransferReceipt {
            status,
            message: MSG_STATUS_CHANGED.to_string(),
        })
    }

    /// Takes the requested page of all transactions, then keeps those matching
    /// the optional source card and status. A given source card must exist.
    pub async fn query(
        &self,
        source: Option<CardId>,
        status: Option<TransactionStatus>,
        page: &PageRequest<TransactionSort>,
    ) -> Result<Vec<TransactionView>> {
        if let Some(card) = source {
            self.require_card(card).await?;
        }
        let rows = self.transactions.find_page(page).await?;
        let views: Vec<TransactionView> = rows
            .iter()
            .filter(|tx| source.is_none_or(|card| tx.source.id == card))
            .filter(|tx| status.is_none_or(|s| tx.status == s))
            .map(TransactionView::from)
            .collect();
        tracing::debug!(count = views.len(), "Transactions queried");
        Ok(views)
    }

    /// Transactions drawn from one card.
    pub async fn query_by_card(
        &self,
        card: CardId,
        status: Option<TransactionStatus>,
        page: &PageRequest<TransactionSort>,
    ) -> Result<Vec<TransactionView>> {
        self.query(Some(card), status, page).await
    }

    async fn require_card(&self, id: CardId) -> Result<()> {
        if self.cards.exists_by_id(id).await? {
            Ok(())
        } else {
            tracing::error!(card_id = %id, "Card not found");
            Err(BankError::not_found(format!("Card with id={} not found", id)))
        }
    }
}
