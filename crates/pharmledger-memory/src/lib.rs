use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicI64, Ordering},
        RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

use pharmledger_core::{EntryId, LedgerEntry, LedgerEntryCommand, LedgerStore, StorageError};

/// A `LedgerStore` kept entirely in process memory. Ids follow the same
/// never-reused, strictly increasing rule as the SQLite backend.
pub struct InMemoryStorage {
    entries: RwLock<BTreeMap<EntryId, LedgerEntryCommand>>,
    settings: RwLock<BTreeMap<String, String>>,
    id_counter: AtomicI64,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            settings: RwLock::new(BTreeMap::new()),
            id_counter: AtomicI64::new(1),
        }
    }

    fn next_id(&self) -> EntryId {
        self.id_counter.fetch_add(1, Ordering::SeqCst)
    }

    fn entries(&self) -> Result<RwLockReadGuard<'_, BTreeMap<EntryId, LedgerEntryCommand>>, StorageError> {
        self.entries.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn entries_mut(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<EntryId, LedgerEntryCommand>>, StorageError> {
        self.entries.write().map_err(|_| StorageError::LockPoisoned)
    }
}

fn to_entry((id, values): (&EntryId, &LedgerEntryCommand)) -> LedgerEntry {
    LedgerEntry {
        id: *id,
        values: values.clone(),
    }
}

impl LedgerStore for InMemoryStorage {
    fn initialize(&self) -> Result<(), StorageError> {
        Ok(())
    }

    fn create_entry(&self, command: &LedgerEntryCommand) -> Result<EntryId, StorageError> {
        let mut entries = self.entries_mut()?;
        let id = self.next_id();
        entries.insert(id, command.clone());
        tracing::debug!(id, date = %command.date, "Entry created");
        Ok(id)
    }

    fn update_entry(&self, id: EntryId, command: &LedgerEntryCommand) -> Result<usize, StorageError> {
        let mut entries = self.entries_mut()?;
        match entries.get_mut(&id) {
            Some(existing) => {
                *existing = command.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn delete_entry(&self, id: EntryId) -> Result<usize, StorageError> {
        let mut entries = self.entries_mut()?;
        Ok(entries.remove(&id).map_or(0, |_| 1))
    }

    fn set_opening_petty(&self, id: EntryId, opening_petty: f64) -> Result<usize, StorageError> {
        let mut entries = self.entries_mut()?;
        match entries.get_mut(&id) {
            Some(existing) => {
                existing.opening_petty = opening_petty;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn list_recent(&self, limit: usize) -> Result<Vec<LedgerEntry>, StorageError> {
        let entries = self.entries()?;
        let mut result: Vec<LedgerEntry> = entries.iter().map(to_entry).collect();
        result.sort_by(|a, b| b.values.date.cmp(&a.values.date).then(b.id.cmp(&a.id)));
        result.truncate(limit);
        Ok(result)
    }

    fn list_all(&self) -> Result<Vec<LedgerEntry>, StorageError> {
        Ok(self.entries()?.iter().map(to_entry).collect())
    }

    fn latest_entry(&self) -> Result<Option<LedgerEntry>, StorageError> {
        Ok(self.entries()?.iter().next_back().map(to_entry))
    }

    fn find_by_date(&self, date: &str) -> Result<Option<EntryId>, StorageError> {
        Ok(self
            .entries()?
            .iter()
            .find(|(_, values)| values.date == date)
            .map(|(id, _)| *id))
    }

    fn get_setting(&self, key: &str) -> Result<Option<String>, StorageError> {
        let settings = self.settings.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(settings.get(key).cloned())
    }

    fn set_setting(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut settings = self.settings.write().map_err(|_| StorageError::LockPoisoned)?;
        settings.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
