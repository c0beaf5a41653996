//! Outer adapters that feed commands in and write reports out.

pub mod csv;
