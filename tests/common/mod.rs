#![allow(dead_code)]

use bankcards::application::{Bank, OpeningBalance, Stores};
use bankcards::domain::card::{Card, CardId, CardNumber, CardStatus};
use bankcards::domain::money::Balance;
use bankcards::domain::user::User;
use bankcards::infrastructure::clock::ManualClock;
use bankcards::infrastructure::encryption::{CardCipher, KdfParams};
use bankcards::infrastructure::in_memory::{InMemoryCardStore, InMemoryTransactionStore, InMemoryUserStore};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;

pub const PASSPHRASE: &str = "integration-passphrase";
pub const SALT: &str = "integration-salt";

/// KDF costs small enough to keep the suite fast.
pub const FAST_KDF: KdfParams = KdfParams {
    time_cost: 1,
    memory_cost: 64,
    parallelism: 1,
};

pub struct Harness {
    pub bank: Bank,
    pub cards: InMemoryCardStore,
    pub transactions: InMemoryTransactionStore,
}

pub fn cipher() -> CardCipher {
    CardCipher::derive(PASSPHRASE, SALT, FAST_KDF).unwrap()
}

pub fn harness(opening_balance: Decimal) -> Harness {
    let cards = InMemoryCardStore::new(Arc::new(cipher()));
    let transactions = InMemoryTransactionStore::new();
    let stores = Stores {
        cards: Arc::new(cards.clone()),
        transactions: Arc::new(transactions.clone()),
        users: Arc::new(InMemoryUserStore::new()),
    };
    let bank = Bank::new(
        stores,
        Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())),
        OpeningBalance::Fixed(Balance::new(opening_balance).unwrap()),
    );
    Harness {
        bank,
        cards,
        transactions,
    }
}

impl Harness {
    /// Places a card directly in the store with the given status and balance.
    pub async fn seed(&self, id: u64, owner: &User, status: CardStatus, balance: Decimal) -> CardId {
        self.cards
            .insert(&Card {
                id: CardId(id),
                number: CardNumber::parse(&number(id)).unwrap(),
                owner: owner.clone(),
                expiration: NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
                balance: Balance::new(balance).unwrap(),
                status,
            })
            .await
            .unwrap();
        CardId(id)
    }
}

pub fn number(id: u64) -> String {
    format!("{:016}", 5500_0000_0000_0000u64 + id)
}

/// Writes a command CSV with the standard header.
pub fn commands_csv(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "op, principal, card, target, amount, number, status, expires, tx").unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

/// Writes a config file with fast KDF settings and the test key material.
pub fn config_file(dir: &Path) -> std::path::PathBuf {
    config_file_with_page_size(dir, 2)
}

pub fn config_file_with_page_size(dir: &Path, page_size: usize) -> std::path::PathBuf {
    let path = dir.join("config.json");
    std::fs::write(
        &path,
        format!(
            r#"{{
                "logging": {{ "level": "warn" }},
                "encryption": {{ "passphrase": "{PASSPHRASE}", "salt": "{SALT}", "time_cost": 1, "memory_cost": 64, "parallelism": 1 }},
                "cards": {{ "opening_balance": {{ "fixed": "1000.00" }} }},
                "page_size": {page_size}
            }}"#
        ),
    )
    .unwrap();
    path
}

/// Writes a script that registers one holder, issues `cards` cards and then
/// cycles `transfers` transfers through them.
pub fn generate_transfer_csv(path: &Path, cards: u64, transfers: usize) -> std::io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(["op", "principal", "card", "target", "amount", "number", "status", "expires", "tx"])?;
    wtr.write_record(["register", "load", "", "", "", "", "", "", ""])?;
    for id in 1..=cards {
        wtr.write_record(["create", "load", "", "", "", &number(id), "", "2099-12-31", ""])?;
    }
    for i in 0..transfers {
        let from = (i as u64 % cards) + 1;
        let to = from % cards + 1;
        wtr.write_record([
            "transfer",
            "load",
            &from.to_string(),
            &to.to_string(),
            "1.00",
            "",
            "",
            "",
            "",
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
