use super::locks::CardLocks;
use super::users::UserDirectory;
use crate::domain::card::{Card, CardId};
use crate::domain::money::Amount;
use crate::domain::ports::{SharedCardStore, SharedClock, SharedTransactionStore};
use crate::domain::transaction::{CardRef, NewTransaction, TransferReceipt, assess};
use crate::domain::user::Principal;
use crate::error::{BankError, Result};

/// Orchestrates money movement requests between a principal's own cards.
///
/// A request that passes identity and ownership checks always leaves exactly
/// one transaction behind, whatever its business outcome. Balances are read
/// but never changed here.
///
/// The pair of cards is locked (lower id first) for the whole
/// read-assess-record sequence, so decisions against the same card are
/// serialized.
#[derive(Clone)]
pub struct TransferEngine {
    cards: SharedCardStore,
    transactions: SharedTransactionStore,
    users: UserDirectory,
    locks: CardLocks,
    clock: SharedClock,
}

impl TransferEngine {
    pub fn new(
        cards: SharedCardStore,
        transactions: SharedTransactionStore,
        users: UserDirectory,
        locks: CardLocks,
        clock: SharedClock,
    ) -> Self {
        Self {
            cards,
            transactions,
            users,
            locks,
            clock,
        }
    }

    pub async fn transfer(
        &self,
        principal: &Principal,
        source_id: CardId,
        target_id: CardId,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        tracing::info!(%principal, source = %source_id, target = %target_id, %amount, "Transfer requested");
        let user = self.users.resolve(principal).await?;

        let _guard = self.locks.lock_pair(source_id, target_id).await;
        let source = self.load(source_id).await?;
        let target = self.load(target_id).await?;

        if !source.is_owned_by(&user) || !target.is_owned_by(&user) {
            tracing::warn!(user_id = %user.id, source = %source_id, target = %target_id, "Transfer rejected: foreign card");
            return Err(BankError::bad_request(
                "Transaction can only be made between your cards",
            ));
        }

        let outcome = assess(&source, &target, amount);
        let record = NewTransaction {
            source: CardRef::from(&source),
            target: CardRef::from(&target),
            amount,
            timestamp: self.clock.now(),
            status: outcome.status,
        };
        let tx = self.transactions.create(record).await.map_err(|e| {
            tracing::error!(error = %e, "Transaction persistence failed");
            BankError::Creation(format!("Failed to create transaction: {}", e))
        })?;

        tracing::info!(tx_id = %tx.id, status = %tx.status, "{}", outcome.message);
        Ok(TransferReceipt {
            status: outcome.status,
            message: outcome.message.to_string(),
        })
    }

    async fn load(&self, id: CardId) -> Result<Card> {
        self.cards.find_by_id(id).await?.ok_or_else(|| {
            tracing::error!(card_id = %id, "Card not found");
            BankError::not_found(format!("Card with id={} not found", id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{CardNumber, CardStatus};
    use crate::domain::money::Balance;
    use crate::domain::page::PageRequest;
    use crate::domain::ports::{CardStore, TransactionStore};
    use crate::domain::transaction::{
        MSG_BLOCKED, MSG_EXPIRED, MSG_INSUFFICIENT_FUNDS, MSG_PROCESSING, NewTransaction,
        Transaction, TransactionId, TransactionStatus,
    };
    use crate::domain::user::User;
    use crate::error::ErrorKind;
    use crate::infrastructure::clock::ManualClock;
    use crate::infrastructure::encryption::tests::test_cipher;
    use crate::infrastructure::in_memory::{
        InMemoryCardStore, InMemoryTransactionStore, InMemoryUserStore,
    };
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    struct Fixture {
        engine: TransferEngine,
        cards: InMemoryCardStore,
        ledger: InMemoryTransactionStore,
        alice: User,
        bob: User,
    }

    async fn fixture() -> Fixture {
        let cards = InMemoryCardStore::new(Arc::new(test_cipher()));
        let ledger = InMemoryTransactionStore::new();
        let users = UserDirectory::new(Arc::new(InMemoryUserStore::new()));
        let alice = users.register("alice").await.unwrap();
        let bob = users.register("bob").await.unwrap();
        let engine = TransferEngine::new(
            Arc::new(cards.clone()),
            Arc::new(ledger.clone()),
            users,
            CardLocks::new(),
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())),
        );
        Fixture { engine, cards, ledger, alice, bob }
    }

    impl Fixture {
        async fn card(&self, id: u64, owner: &User, status: CardStatus, balance: Decimal) -> CardId {
            self.cards
                .insert(&Card {
                    id: CardId(id),
                    number: CardNumber::parse(&format!("{:016}", 4000_0000_0000_0000u64 + id)).unwrap(),
                    owner: owner.clone(),
                    expiration: NaiveDate::from_ymd_opt(2030, 1, 31).unwrap(),
                    balance: Balance::new(balance).unwrap(),
                    status,
                })
                .await
                .unwrap();
            CardId(id)
        }

        async fn ledger_len(&self) -> usize {
            self.ledger.find_page(&PageRequest::new(0, 1000)).await.unwrap().len()
        }
    }

    fn alice() -> Principal {
        Principal::new("alice").unwrap()
    }

    fn amount(value: Decimal) -> Amount {
        Amount::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_eligible_transfer_is_pending() {
        let f = fixture().await;
        let source = f.card(1, &f.alice, CardStatus::Active, dec!(1000.00)).await;
        let target = f.card(2, &f.alice, CardStatus::Active, dec!(0)).await;

        let receipt = f.engine.transfer(&alice(), source, target, amount(dec!(100.00))).await.unwrap();
        assert_eq!(receipt.status, TransactionStatus::Pending);
        assert_eq!(receipt.message, MSG_PROCESSING);

        let stored = f.ledger.find_by_id(TransactionId(1)).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Pending);
        assert_eq!(stored.source.id, source);
        assert_eq!(stored.source.masked_number, "**** **** **** 0001");
        assert_eq!(stored.amount.to_string(), "100.00");
    }

    #[tokio::test]
    async fn test_balances_are_not_mutated() {
        let f = fixture().await;
        let source = f.card(1, &f.alice, CardStatus::Active, dec!(1000.00)).await;
        let target = f.card(2, &f.alice, CardStatus::Active, dec!(5.00)).await;
        f.engine.transfer(&alice(), source, target, amount(dec!(100.00))).await.unwrap();

        let source = f.cards.find_by_id(source).await.unwrap().unwrap();
        let target = f.cards.find_by_id(target).await.unwrap().unwrap();
        assert_eq!(source.balance.value(), dec!(1000.00));
        assert_eq!(target.balance.value(), dec!(5.00));
    }

    #[tokio::test]
    async fn test_business_failures_are_recorded_not_raised() {
        let f = fixture().await;
        let blocked = f.card(1, &f.alice, CardStatus::Blocked, dec!(1000.00)).await;
        let expired = f.card(2, &f.alice, CardStatus::Expired, dec!(1000.00)).await;
        let poor = f.card(3, &f.alice, CardStatus::Active, dec!(5.00)).await;
        let target = f.card(4, &f.alice, CardStatus::Active, dec!(0)).await;

        let cases = [
            (blocked, target, MSG_BLOCKED),
            (target, blocked, MSG_BLOCKED),
            (expired, target, MSG_EXPIRED),
            (blocked, expired, MSG_BLOCKED),
            (poor, target, MSG_INSUFFICIENT_FUNDS),
        ];
        for (i, (from, to, message)) in cases.into_iter().enumerate() {
            let receipt = f.engine.transfer(&alice(), from, to, amount(dec!(10.00))).await.unwrap();
            assert_eq!(receipt.status, TransactionStatus::Failed);
            assert_eq!(receipt.message, message);
            assert_eq!(f.ledger_len().await, i + 1);
        }
    }

    #[tokio::test]
    async fn test_foreign_card_rejected_without_record() {
        let f = fixture().await;
        let mine = f.card(1, &f.alice, CardStatus::Active, dec!(1000.00)).await;
        let theirs = f.card(2, &f.bob, CardStatus::Active, dec!(1000.00)).await;

        for (from, to) in [(mine, theirs), (theirs, mine), (theirs, theirs)] {
            let err = f.engine.transfer(&alice(), from, to, amount(dec!(1.00))).await.unwrap_err();
            assert_eq!(err.to_string(), "Transaction can only be made between your cards");
        }
        assert_eq!(f.ledger_len().await, 0);
    }

    #[tokio::test]
    async fn test_missing_card_or_user_is_not_found() {
        let f = fixture().await;
        let mine = f.card(1, &f.alice, CardStatus::Active, dec!(1000.00)).await;

        let err = f.engine.transfer(&alice(), mine, CardId(99), amount(dec!(1.00))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = f
            .engine
            .transfer(&Principal::new("ghost").unwrap(), mine, mine, amount(dec!(1.00)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(f.ledger_len().await, 0);
    }

    #[tokio::test]
    async fn test_self_transfer_is_allowed() {
        let f = fixture().await;
        let card = f.card(1, &f.alice, CardStatus::Active, dec!(50.00)).await;
        let receipt = f.engine.transfer(&alice(), card, card, amount(dec!(10.00))).await.unwrap();
        assert_eq!(receipt.status, TransactionStatus::Pending);
    }

    struct BrokenLedger;

    #[async_trait]
    impl TransactionStore for BrokenLedger {
        async fn create(&self, _tx: NewTransaction) -> Result<Transaction> {
            Err(BankError::Io(std::io::Error::other("connection reset")))
        }
        async fn save(&self, _tx: &Transaction) -> Result<()> {
            Ok(())
        }
        async fn find_by_id(&self, _id: TransactionId) -> Result<Option<Transaction>> {
            Ok(None)
        }
        async fn find_page(
            &self,
            _page: &PageRequest<crate::domain::page::TransactionSort>,
        ) -> Result<Vec<Transaction>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_ledger_failure_is_creation_failure() {
        let f = fixture().await;
        let source = f.card(1, &f.alice, CardStatus::Active, dec!(1000.00)).await;
        let target = f.card(2, &f.alice, CardStatus::Active, dec!(0)).await;
        let users = UserDirectory::new(Arc::new(InMemoryUserStore::new()));
        users.register("alice").await.unwrap();
        let engine = TransferEngine::new(
            Arc::new(f.cards.clone()),
            Arc::new(BrokenLedger),
            users,
            CardLocks::new(),
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())),
        );

        let err = engine.transfer(&alice(), source, target, amount(dec!(1.00))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Creation);
        assert_eq!(err.to_string(), "Failed to create transaction: IO error: connection reset");
    }
}
