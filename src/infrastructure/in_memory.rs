use crate::domain::card::{Card, CardId, CardRecord, NewCard};
use crate::domain::page::{CardSort, PageRequest, TransactionSort};
use crate::domain::ports::{CardFilter, CardStore, SharedCodec, TransactionStore, UserStore};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId};
use crate::domain::user::{User, UserId};
use crate::error::{BankError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct CardTable {
    records: BTreeMap<CardId, CardRecord>,
    by_digest: HashMap<String, CardId>,
    last_id: u64,
}

/// A thread-safe in-memory card store.
///
/// Records are kept sealed exactly as a persistent backend would hold them;
/// the codec is applied on every read and write.
#[derive(Clone)]
pub struct InMemoryCardStore {
    table: Arc<RwLock<CardTable>>,
    codec: SharedCodec,
}

impl InMemoryCardStore {
    /// Creates a new, empty card store sealing numbers with `codec`.
    pub fn new(codec: SharedCodec) -> Self {
        Self {
            table: Arc::new(RwLock::new(CardTable::default())),
            codec,
        }
    }

    /// Inserts a card as-is, keeping its id and status. Used to seed state.
    pub async fn insert(&self, card: &Card) -> Result<()> {
        let record = CardRecord::seal(card, self.codec.as_ref())?;
        let mut table = self.table.write().await;
        table.last_id = table.last_id.max(card.id.0);
        table.by_digest.insert(record.number_digest.clone(), card.id);
        table.records.insert(card.id, record);
        Ok(())
    }
}

#[async_trait]
impl CardStore for InMemoryCardStore {
    async fn create(&self, card: NewCard) -> Result<Card> {
        let digest = self.codec.digest(card.number.as_str());
        let mut table = self.table.write().await;
        if table.by_digest.contains_key(&digest) {
            return Err(BankError::bad_request("Card number is already registered"));
        }
        let id = CardId(table.last_id + 1);
        let card = card.into_card(id);
        let record = CardRecord::seal(&card, self.codec.as_ref())?;

        table.last_id = id.0;
        table.by_digest.insert(digest, id);
        table.records.insert(id, record);
        Ok(card)
    }

    async fn save(&self, card: &Card) -> Result<()> {
        let record = CardRecord::seal(card, self.codec.as_ref())?;
        let mut table = self.table.write().await;
        if !table.records.contains_key(&card.id) {
            return Err(BankError::not_found(format!("Card with id={} not found", card.id)));
        }
        table.records.insert(card.id, record);
        Ok(())
    }

    async fn find_by_id(&self, id: CardId) -> Result<Option<Card>> {
        let table = self.table.read().await;
        table
            .records
            .get(&id)
            .map(|record| record.open(self.codec.as_ref()))
            .transpose()
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Card>> {
        let digest = self.codec.digest(number);
        let table = self.table.read().await;
        table
            .by_digest
            .get(&digest)
            .and_then(|id| table.records.get(id))
            .map(|record| record.open(self.codec.as_ref()))
            .transpose()
    }

    async fn find_page(&self, filter: CardFilter, page: &PageRequest<CardSort>) -> Result<Vec<Card>> {
        let table = self.table.read().await;
        let matching: Vec<&CardRecord> = table
            .records
            .values()
            .filter(|record| filter.accepts(record.owner.id, record.status))
            .collect();
        page.apply(matching, |a, b| page.sort.compare(a, b))
            .into_iter()
            .map(|record| record.open(self.codec.as_ref()))
            .collect()
    }

    async fn delete_by_id(&self, id: CardId) -> Result<()> {
        let mut table = self.table.write().await;
        if let Some(record) = table.records.remove(&id) {
            table.by_digest.remove(&record.number_digest);
        }
        Ok(())
    }

    async fn exists_by_id(&self, id: CardId) -> Result<bool> {
        Ok(self.table.read().await.records.contains_key(&id))
    }
}

#[derive(Default)]
struct TransactionTable {
    rows: BTreeMap<TransactionId, Transaction>,
    last_id: u64,
}

/// A thread-safe in-memory ledger store.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    table: Arc<RwLock<TransactionTable>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn create(&self, tx: NewTransaction) -> Result<Transaction> {
        let mut table = self.table.write().await;
        let id = TransactionId(table.last_id + 1);
        let tx = tx.into_transaction(id);
        table.last_id = id.0;
        table.rows.insert(id, tx.clone());
        Ok(tx)
    }

    async fn save(&self, tx: &Transaction) -> Result<()> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&tx.id) {
            return Err(BankError::not_found(format!(
                "Transaction with id={} not found",
                tx.id
            )));
        }
        table.rows.insert(tx.id, tx.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_page(&self, page: &PageRequest<TransactionSort>) -> Result<Vec<Transaction>> {
        let table = self.table.read().await;
        let all: Vec<Transaction> = table.rows.values().cloned().collect();
        Ok(page.apply(all, |a, b| page.sort.compare(a, b)))
    }
}

#[derive(Default)]
struct UserTable {
    by_name: HashMap<String, User>,
    last_id: u64,
}

#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    table: Arc<RwLock<UserTable>>,
}

impl InMemoryUserStore {
    /// Creates a new, empty in-memory user store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, username: &str) -> Result<User> {
        let mut table = self.table.write().await;
        if table.by_name.contains_key(username) {
            return Err(BankError::bad_request(format!(
                "User {} already exists",
                username
            )));
        }
        let user = User {
            id: UserId(table.last_id + 1),
            username: username.to_string(),
        };
        table.last_id = user.id.0;
        table.by_name.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.table.read().await.by_name.get(username).cloned())
    }
}
