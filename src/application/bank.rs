use super::balance::OpeningBalance;
use super::cards::CardService;
use super::ledger::TransactionLedger;
use super::locks::CardLocks;
use super::transfer::TransferEngine;
use super::users::UserDirectory;
use crate::domain::ports::{SharedCardStore, SharedClock, SharedCodec, SharedTransactionStore, SharedUserStore};
use crate::infrastructure::in_memory::{InMemoryCardStore, InMemoryTransactionStore, InMemoryUserStore};
use std::sync::Arc;

/// The storage backends a `Bank` runs on.
#[derive(Clone)]
pub struct Stores {
    pub cards: SharedCardStore,
    pub transactions: SharedTransactionStore,
    pub users: SharedUserStore,
}

impl Stores {
    pub fn in_memory(codec: SharedCodec) -> Self {
        Self {
            cards: Arc::new(InMemoryCardStore::new(codec)),
            transactions: Arc::new(InMemoryTransactionStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
        }
    }

    /// One RocksDB instance backing all three stores.
    #[cfg(feature = "storage-rocksdb")]
    pub fn rocksdb(path: impl AsRef<std::path::Path>, codec: SharedCodec) -> crate::error::Result<Self> {
        let store = crate::infrastructure::rocksdb::RocksDBStore::open(path, codec)?;
        Ok(Self {
            cards: Arc::new(store.clone()),
            transactions: Arc::new(store.clone()),
            users: Arc::new(store),
        })
    }
}

/// All services wired onto one set of stores and one lock registry.
#[derive(Clone)]
pub struct Bank {
    pub users: UserDirectory,
    pub cards: CardService,
    pub transfers: TransferEngine,
    pub ledger: TransactionLedger,
    pub locks: CardLocks,
}

impl Bank {
    pub fn new(stores: Stores, clock: SharedClock, opening_balance: OpeningBalance) -> Self {
        let users = UserDirectory::new(stores.users);
        let locks = CardLocks::new();
        Self {
            cards: CardService::new(
                stores.cards.clone(),
                users.clone(),
                locks.clone(),
                clock.clone(),
                opening_balance,
            ),
            transfers: TransferEngine::new(
                stores.cards.clone(),
                stores.transactions.clone(),
                users.clone(),
                locks.clone(),
                clock,
            ),
            ledger: TransactionLedger::new(stores.transactions, stores.cards),
            users,
            locks,
        }
    }
}
