//! Domain types and rules. Nothing in here performs I/O.

pub mod card;
pub mod lifecycle;
pub mod money;
pub mod page;
pub mod ports;
pub mod transaction;
pub mod user;
