use crate::models::{
    read::LedgerEntry, write::LedgerEntryCommand, EntryId, SetupOutcome, ADMIN_PASSWORD_KEY,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
    #[error("storage lock poisoned")]
    LockPoisoned,
}

/// The ledger table plus the key/value settings table.
///
/// Update and delete report the number of rows affected; zero is a
/// successful no-op, not an error.
pub trait LedgerStore: Send + Sync {
    /// Creates missing tables. Never touches existing rows.
    fn initialize(&self) -> Result<(), StorageError>;

    fn create_entry(&self, command: &LedgerEntryCommand) -> Result<EntryId, StorageError>;
    fn update_entry(&self, id: EntryId, command: &LedgerEntryCommand) -> Result<usize, StorageError>;
    fn delete_entry(&self, id: EntryId) -> Result<usize, StorageError>;
    fn set_opening_petty(&self, id: EntryId, opening_petty: f64) -> Result<usize, StorageError>;

    /// Entries ordered by the `date` string descending (lexical, not
    /// chronological), ties by descending id, at most `limit` rows.
    fn list_recent(&self, limit: usize) -> Result<Vec<LedgerEntry>, StorageError>;
    /// Every entry in ascending id order.
    fn list_all(&self) -> Result<Vec<LedgerEntry>, StorageError>;
    /// The entry with the highest id.
    fn latest_entry(&self) -> Result<Option<LedgerEntry>, StorageError>;
    /// Lowest id whose `date` equals `date` exactly.
    fn find_by_date(&self, date: &str) -> Result<Option<EntryId>, StorageError>;

    fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Stores the admin password, then seeds `today`'s row with the opening
    /// petty cash or, if a row for `today` exists, overwrites only its
    /// `opening_petty`.
    fn setup(&self, password: &str, opening_petty: f64, today: &str) -> Result<SetupOutcome, StorageError> {
        self.set_setting(ADMIN_PASSWORD_KEY, password)?;
        match self.find_by_date(today)? {
            Some(id) => {
                self.set_opening_petty(id, opening_petty)?;
                Ok(SetupOutcome::Updated(id))
            }
            None => {
                let id = self.create_entry(&LedgerEntryCommand::opening(today, opening_petty))?;
                Ok(SetupOutcome::Created(id))
            }
        }
    }
}
