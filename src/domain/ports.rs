use super::card::{Card, CardId, CardStatus, NewCard};
use super::page::{CardSort, PageRequest, TransactionSort};
use super::transaction::{NewTransaction, Transaction, TransactionId};
use super::user::{User, UserId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;

/// Selection criteria for card queries. `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub owner: Option<UserId>,
    pub status: Option<CardStatus>,
}

impl CardFilter {
    pub fn accepts(&self, owner: UserId, status: CardStatus) -> bool {
        self.owner.is_none_or(|o| o == owner) && self.status.is_none_or(|s| s == status)
    }
}

/// Keyed persistence for cards. Implementations keep card numbers sealed at
/// rest and look them up through the codec's digest.
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Inserts a new card with status ACTIVE and assigns its identifier.
    async fn create(&self, card: NewCard) -> Result<Card>;
    /// Overwrites an existing card.
    async fn save(&self, card: &Card) -> Result<()>;
    async fn find_by_id(&self, id: CardId) -> Result<Option<Card>>;
    /// Exact-match lookup by cleartext number.
    async fn find_by_number(&self, number: &str) -> Result<Option<Card>>;
    async fn find_page(&self, filter: CardFilter, page: &PageRequest<CardSort>) -> Result<Vec<Card>>;
    async fn delete_by_id(&self, id: CardId) -> Result<()>;
    async fn exists_by_id(&self, id: CardId) -> Result<bool>;

    async fn find_all(&self, page: &PageRequest<CardSort>) -> Result<Vec<Card>> {
        self.find_page(CardFilter::default(), page).await
    }

    async fn find_by_owner(&self, owner: UserId, page: &PageRequest<CardSort>) -> Result<Vec<Card>> {
        let filter = CardFilter {
            owner: Some(owner),
            status: None,
        };
        self.find_page(filter, page).await
    }

    async fn find_by_status(
        &self,
        status: CardStatus,
        page: &PageRequest<CardSort>,
    ) -> Result<Vec<Card>> {
        let filter = CardFilter {
            owner: None,
            status: Some(status),
        };
        self.find_page(filter, page).await
    }

    async fn find_by_status_and_owner(
        &self,
        status: CardStatus,
        owner: UserId,
        page: &PageRequest<CardSort>,
    ) -> Result<Vec<Card>> {
        let filter = CardFilter {
            owner: Some(owner),
            status: Some(status),
        };
        self.find_page(filter, page).await
    }
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Inserts a new transaction and assigns its identifier.
    async fn create(&self, tx: NewTransaction) -> Result<Transaction>;
    async fn save(&self, tx: &Transaction) -> Result<()>;
    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>>;
    async fn find_page(&self, page: &PageRequest<TransactionSort>) -> Result<Vec<Transaction>>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Registers a username. Fails with `BadRequest` if it is taken.
    async fn create(&self, username: &str) -> Result<User>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Reversible transform between a cleartext card number and its stored token.
pub trait CardNumberCodec: Send + Sync {
    fn encode(&self, plaintext: &str) -> Result<String>;
    fn decode(&self, token: &str) -> Result<String>;
    /// Keyed, deterministic digest used for exact-match lookups.
    fn digest(&self, plaintext: &str) -> String;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

pub type SharedCardStore = Arc<dyn CardStore>;
pub type SharedTransactionStore = Arc<dyn TransactionStore>;
pub type SharedUserStore = Arc<dyn UserStore>;
pub type SharedCodec = Arc<dyn CardNumberCodec>;
pub type SharedClock = Arc<dyn Clock>;
