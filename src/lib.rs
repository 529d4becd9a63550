pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod mirror;
pub mod service;
pub mod storage;

pub use pharmledger_core::{
    EntryId, LedgerEntry, LedgerEntryCommand, LedgerStore, SetupCommand, SetupOutcome,
    StorageError, ADMIN_PASSWORD_KEY,
};
