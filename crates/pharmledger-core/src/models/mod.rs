pub mod write;
pub mod read;

/// Store-assigned identifier of a ledger entry.
pub type EntryId = i64;

/// Settings key holding the admin password. Its presence marks setup as done.
pub const ADMIN_PASSWORD_KEY: &str = "admin_password";

/// Which branch the one-time setup took for today's row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    Created(EntryId),
    Updated(EntryId),
}

impl SetupOutcome {
    pub fn entry_id(&self) -> EntryId {
        match self {
            SetupOutcome::Created(id) | SetupOutcome::Updated(id) => *id,
        }
    }
}
