//! Adapters behind the domain ports: stores, the card number codec and clocks.

pub mod clock;
pub mod encryption;
pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
