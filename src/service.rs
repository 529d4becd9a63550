use std::sync::Arc;

use pharmledger_core::{
    EntryId, LedgerEntry, LedgerEntryCommand, LedgerStore, SetupCommand, SetupOutcome,
    StorageError, ADMIN_PASSWORD_KEY,
};

use crate::{
    auth,
    export::{self, ExportError},
    mirror::MirrorQueue,
};

/// The operations offered to request handlers. The store is authoritative;
/// the mirror only ever sees entries whose store write already succeeded.
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    mirror: Option<MirrorQueue>,
    default_password: String,
    history_limit: usize,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>, default_password: impl Into<String>) -> Self {
        Self {
            store,
            mirror: None,
            default_password: default_password.into(),
            history_limit: 50,
        }
    }

    pub fn with_mirror(mut self, mirror: MirrorQueue) -> Self {
        self.mirror = Some(mirror);
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn store(&self) -> &Arc<dyn LedgerStore> {
        &self.store
    }

    pub fn add_entry(&self, command: LedgerEntryCommand) -> Result<EntryId, StorageError> {
        let id = self.store.create_entry(&command)?;
        metrics::increment_counter!("pharmledger_entries_created_total");
        tracing::info!(id, date = %command.date, "Ledger entry added");

        if let Some(mirror) = &self.mirror {
            mirror.submit(command);
        }
        Ok(id)
    }

    pub fn update_entry(&self, id: EntryId, command: &LedgerEntryCommand) -> Result<(), StorageError> {
        let affected = self.store.update_entry(id, command)?;
        metrics::increment_counter!("pharmledger_entries_updated_total");
        if affected == 0 {
            tracing::debug!(id, "Update addressed a missing entry");
        } else {
            tracing::info!(id, "Ledger entry updated");
        }
        Ok(())
    }

    pub fn delete_entry(&self, id: EntryId) -> Result<(), StorageError> {
        let affected = self.store.delete_entry(id)?;
        metrics::increment_counter!("pharmledger_entries_deleted_total");
        if affected == 0 {
            tracing::debug!(id, "Delete addressed a missing entry");
        } else {
            tracing::info!(id, "Ledger entry deleted");
        }
        Ok(())
    }

    pub fn history(&self) -> Result<Vec<LedgerEntry>, StorageError> {
        self.store.list_recent(self.history_limit)
    }

    pub fn latest(&self) -> Result<Option<LedgerEntry>, StorageError> {
        self.store.latest_entry()
    }

    pub fn validate_admin(&self, password: &str) -> Result<bool, StorageError> {
        let expected = auth::effective_admin_password(self.store.as_ref(), &self.default_password)?;
        let valid = auth::passwords_match(password, &expected);
        if !valid {
            tracing::warn!("Rejected admin password");
        }
        Ok(valid)
    }

    pub fn is_setup(&self) -> Result<bool, StorageError> {
        Ok(self.store.get_setting(ADMIN_PASSWORD_KEY)?.is_some())
    }

    /// One-time setup dated with today's local calendar day.
    pub fn setup(&self, command: &SetupCommand) -> Result<SetupOutcome, StorageError> {
        self.setup_on(command, &today())
    }

    pub fn setup_on(&self, command: &SetupCommand, date: &str) -> Result<SetupOutcome, StorageError> {
        let outcome = self
            .store
            .setup(&command.password, command.opening_petty, date)?;
        tracing::info!(?outcome, date, opening_petty = command.opening_petty, "Initial setup stored");
        Ok(outcome)
    }

    pub fn export_csv(&self) -> Result<Vec<u8>, ExportError> {
        export::export_csv(self.store.as_ref())
    }
}

/// Today's date as `YYYY-MM-DD`, local time when the offset is known.
pub fn today() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let d = now.date();
    format!("{:04}-{:02}-{:02}", d.year(), d.month() as u8, d.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmledger_memory::InMemoryStorage;

    fn service() -> LedgerService {
        LedgerService::new(Arc::new(InMemoryStorage::new()), "1234")
    }

    #[test]
    fn today_is_iso_formatted() {
        let t = today();
        assert_eq!(t.len(), 10);
        assert_eq!(&t[4..5], "-");
        assert_eq!(&t[7..8], "-");
    }

    #[test]
    fn default_password_applies_until_setup() {
        let svc = service();
        assert!(!svc.is_setup().unwrap());
        assert!(svc.validate_admin("1234").unwrap());
        assert!(!svc.validate_admin("owner").unwrap());

        svc.setup_on(
            &SetupCommand {
                password: "owner".to_string(),
                opening_petty: 200.0,
            },
            "2024-09-01",
        )
        .unwrap();

        assert!(svc.is_setup().unwrap());
        assert!(svc.validate_admin("owner").unwrap());
        assert!(!svc.validate_admin("1234").unwrap());
    }

    #[test]
    fn history_respects_configured_limit() {
        let svc = service().with_history_limit(3);
        for day in 10..20 {
            svc.add_entry(LedgerEntryCommand::opening(format!("2024-09-{day}"), 0.0))
                .unwrap();
        }
        let history = svc.history().unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].values.date, "2024-09-19");
    }

    #[test]
    fn add_without_mirror_still_persists() {
        let svc = service();
        let id = svc.add_entry(LedgerEntryCommand::opening("2024-09-01", 10.0)).unwrap();
        assert_eq!(svc.latest().unwrap().unwrap().id, id);
    }
}
