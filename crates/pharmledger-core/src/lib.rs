//! Core types and traits for PharmLedger storage backends.
//!
//! This crate provides the `LedgerStore` trait and the ledger data model,
//! enabling pluggable storage implementations in separate crates.

pub mod models;
pub mod storage;

// Re-export key types at crate root for convenience
pub use models::{EntryId, SetupOutcome, ADMIN_PASSWORD_KEY};
pub use models::write::{LedgerEntryCommand, SetupCommand};
pub use models::read::LedgerEntry;
pub use storage::{LedgerStore, StorageError};
