use std::sync::Arc;

// Re-export core storage types so handlers can use crate::storage::*
pub use pharmledger_core::storage::{LedgerStore, StorageError};
pub use pharmledger_memory::InMemoryStorage;
pub use pharmledger_sqlite::SqliteStorage;

use crate::config::{StorageBackendKind, StorageConfig};

/// Opens the configured backend and makes sure its tables exist.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn LedgerStore>, StorageError> {
    let store: Arc<dyn LedgerStore> = match config.backend {
        StorageBackendKind::Sqlite => Arc::new(SqliteStorage::new(&config.path)?),
        StorageBackendKind::Memory => Arc::new(InMemoryStorage::new()),
    };
    store.initialize()?;
    tracing::info!(backend = ?config.backend, path = %config.path, "Ledger store ready");
    Ok(store)
}
