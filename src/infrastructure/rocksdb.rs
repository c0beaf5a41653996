use crate::domain::card::{Card, CardId, CardRecord, NewCard};
use crate::domain::page::{CardSort, PageRequest, TransactionSort};
use crate::domain::ports::{CardFilter, CardStore, SharedCodec, TransactionStore, UserStore};
use crate::domain::transaction::{NewTransaction, Transaction, TransactionId};
use crate::domain::user::{User, UserId};
use crate::error::{BankError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family for sealed card records, keyed by card id.
pub const CF_CARDS: &str = "cards";
/// Column Family mapping card number digests to card ids.
pub const CF_CARD_INDEX: &str = "card_index";
/// Column Family for the transaction ledger, keyed by transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for card holders, keyed by username.
pub const CF_USERS: &str = "users";
/// Column Family for id sequences.
pub const CF_META: &str = "meta";

const SEQ_CARDS: &[u8] = b"seq:cards";
const SEQ_TRANSACTIONS: &[u8] = b"seq:transactions";
const SEQ_USERS: &[u8] = b"seq:users";

/// A persistent store implementation using RocksDB.
///
/// Holds cards, transactions and users in separate Column Families. Inserts
/// that allocate an id or touch an index are serialized through `writer` and
/// committed as a single `WriteBatch`.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    codec: SharedCodec,
    writer: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P, codec: SharedCodec) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs = [CF_CARDS, CF_CARD_INDEX, CF_TRANSACTIONS, CF_USERS, CF_META]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, path, cfs)?;

        Ok(Self {
            db: Arc::new(db),
            codec,
            writer: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            BankError::Internal(Box::new(std::io::Error::other(format!(
                "{} column family not found",
                name
            ))))
        })
    }

    fn get_json<T: DeserializeOwned>(&self, cf: &str, key: &[u8]) -> Result<Option<T>> {
        match self.db.get_cf(self.cf(cf)?, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn scan_json<T: DeserializeOwned>(&self, cf: &str) -> Result<Vec<T>> {
        let mut rows = Vec::new();
        for item in self.db.iterator_cf(self.cf(cf)?, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }

    fn put_json<T: Serialize>(&self, batch: &mut WriteBatch, cf: &str, key: &[u8], value: &T) -> Result<()> {
        batch.put_cf(self.cf(cf)?, key, serde_json::to_vec(value)?);
        Ok(())
    }

    /// Reads the next id of a sequence and stages the bump in `batch`.
    fn next_id(&self, batch: &mut WriteBatch, seq: &[u8]) -> Result<u64> {
        let meta = self.cf(CF_META)?;
        let current = match self.db.get_cf(meta, seq)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    BankError::Internal(Box::new(std::io::Error::other("corrupt id sequence")))
                })?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        batch.put_cf(meta, seq, next.to_be_bytes());
        Ok(next)
    }

    fn lock_writer(&self) -> std::sync::MutexGuard<'_, ()> {
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CardStore for RocksDBStore {
    async fn create(&self, card: NewCard) -> Result<Card> {
        let digest = self.codec.digest(card.number.as_str());
        let _guard = self.lock_writer();
        if self.db.get_cf(self.cf(CF_CARD_INDEX)?, digest.as_bytes())?.is_some() {
            return Err(BankError::bad_request("Card number is already registered"));
        }

        let mut batch = WriteBatch::default();
        let id = CardId(self.next_id(&mut batch, SEQ_CARDS)?);
        let card = card.into_card(id);
        let record = CardRecord::seal(&card, self.codec.as_ref())?;
        self.put_json(&mut batch, CF_CARDS, &id.0.to_be_bytes(), &record)?;
        batch.put_cf(self.cf(CF_CARD_INDEX)?, digest.as_bytes(), id.0.to_be_bytes());
        self.db.write(batch)?;
        Ok(card)
    }

    async fn save(&self, card: &Card) -> Result<()> {
        let record = CardRecord::seal(card, self.codec.as_ref())?;
        let _guard = self.lock_writer();
        let key = card.id.0.to_be_bytes();
        if self.db.get_pinned_cf(self.cf(CF_CARDS)?, key)?.is_none() {
            return Err(BankError::not_found(format!("Card with id={} not found", card.id)));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_CARDS, &key, &record)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn find_by_id(&self, id: CardId) -> Result<Option<Card>> {
        self.get_json::<CardRecord>(CF_CARDS, &id.0.to_be_bytes())?
            .map(|record| record.open(self.codec.as_ref()))
            .transpose()
    }

    async fn find_by_number(&self, number: &str) -> Result<Option<Card>> {
        let digest = self.codec.digest(number);
        let Some(raw_id) = self.db.get_cf(self.cf(CF_CARD_INDEX)?, digest.as_bytes())? else {
            return Ok(None);
        };
        self.get_json::<CardRecord>(CF_CARDS, &raw_id)?
            .map(|record| record.open(self.codec.as_ref()))
            .transpose()
    }

    async fn find_page(&self, filter: CardFilter, page: &PageRequest<CardSort>) -> Result<Vec<Card>> {
        let matching: Vec<CardRecord> = self
            .scan_json::<CardRecord>(CF_CARDS)?
            .into_iter()
            .filter(|record| filter.accepts(record.owner.id, record.status))
            .collect();
        page.apply(matching, |a, b| page.sort.compare(a, b))
            .iter()
            .map(|record| record.open(self.codec.as_ref()))
            .collect()
    }

    async fn delete_by_id(&self, id: CardId) -> Result<()> {
        let _guard = self.lock_writer();
        let key = id.0.to_be_bytes();
        let Some(record) = self.get_json::<CardRecord>(CF_CARDS, &key)? else {
            return Ok(());
        };
        let mut batch = WriteBatch::default();
        batch.delete_cf(self.cf(CF_CARDS)?, key);
        batch.delete_cf(self.cf(CF_CARD_INDEX)?, record.number_digest.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn exists_by_id(&self, id: CardId) -> Result<bool> {
        Ok(self
            .db
            .get_pinned_cf(self.cf(CF_CARDS)?, id.0.to_be_bytes())?
            .is_some())
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn create(&self, tx: NewTransaction) -> Result<Transaction> {
        let _guard = self.lock_writer();
        let mut batch = WriteBatch::default();
        let id = TransactionId(self.next_id(&mut batch, SEQ_TRANSACTIONS)?);
        let tx = tx.into_transaction(id);
        self.put_json(&mut batch, CF_TRANSACTIONS, &id.0.to_be_bytes(), &tx)?;
        self.db.write(batch)?;
        Ok(tx)
    }

    async fn save(&self, tx: &Transaction) -> Result<()> {
        let _guard = self.lock_writer();
        let key = tx.id.0.to_be_bytes();
        if self.db.get_pinned_cf(self.cf(CF_TRANSACTIONS)?, key)?.is_none() {
            return Err(BankError::not_found(format!(
                "Transaction with id={} not found",
                tx.id
            )));
        }
        let mut batch = WriteBatch::default();
        self.put_json(&mut batch, CF_TRANSACTIONS, &key, tx)?;
        self.db.write(batch)?;
        Ok(())
    }

    async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>> {
        self.get_json(CF_TRANSACTIONS, &id.0.to_be_bytes())
    }

    async fn find_page(&self, page: &PageRequest<TransactionSort>) -> Result<Vec<Transaction>> {
        let all = self.scan_json::<Transaction>(CF_TRANSACTIONS)?;
        Ok(page.apply(all, |a, b| page.sort.compare(a, b)))
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn create(&self, username: &str) -> Result<User> {
        let _guard = self.lock_writer();
        if self.db.get_pinned_cf(self.cf(CF_USERS)?, username.as_bytes())?.is_some() {
            return Err(BankError::bad_request(format!(
                "User {} already exists",
                username
            )));
        }
        let mut batch = WriteBatch::default();
        let user = User {
            id: UserId(self.next_id(&mut batch, SEQ_USERS)?),
            username: username.to_string(),
        };
        self.put_json(&mut batch, CF_USERS, username.as_bytes(), &user)?;
        self.db.write(batch)?;
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_json(CF_USERS, username.as_bytes())
    }
}
