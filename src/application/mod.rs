//! Application layer orchestrating the card and ledger use cases.
//!
//! Services here hold no state of their own beyond shared handles to the
//! stores. `TransferEngine` and `CardService::moderate` serialize their
//! decisions per card through a shared `CardLocks` registry.

pub mod balance;
pub mod bank;
pub mod cards;
pub mod ledger;
pub mod locks;
pub mod transfer;
pub mod users;

pub use balance::OpeningBalance;
pub use bank::{Bank, Stores};
pub use cards::{CardRequest, CardService};
pub use ledger::TransactionLedger;
pub use locks::CardLocks;
pub use transfer::TransferEngine;
pub use users::UserDirectory;
